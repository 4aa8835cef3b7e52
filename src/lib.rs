//! RoomLink controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod registry;
pub mod remote;
pub mod scheduler;

// Hardware-facing modules compile on every target; the ESP-IDF parts are
// cfg-gated inside, with simulation stand-ins on the host.
pub mod adapters;
pub mod drivers;
pub mod sensors;
