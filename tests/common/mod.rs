//! Common utilities for integration tests

#![allow(dead_code)]

pub mod mock_models;
pub mod test_helpers;

// Re-export commonly used items
pub use mock_models::{CountingOracle, Fault, FaultyOracle, LinearPartitionOracle};
pub use test_helpers::{
    assert_profiles_close,
    co2_scenario,
    kremser_outlet,
    relative_error,
    voc_scenario,
};
