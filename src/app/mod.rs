//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules of the RoomLink controller: applying
//! remote change events, sampling on a fixed cadence and keeping the
//! display current.  All interaction with hardware and the network happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
pub mod state;
