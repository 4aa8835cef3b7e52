//! Sensor drivers.

pub mod dht;

pub use dht::{Dht11, DhtFrame};
