//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that drives the `ReconciliationLoop`
//! through one concern against mock adapters.  All tests run on the host
//! with no real hardware or network required.

mod cadence_tests;
mod mock_hw;
mod recovery_tests;
mod stream_tests;
