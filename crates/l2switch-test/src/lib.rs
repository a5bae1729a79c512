//! Integration test infrastructure for the L2 learning switch
//!
//! Provides:
//! - Frame and packet-in builders
//! - A test bed wiring a learning switch to an in-memory fabric
//! - Fabric and learning-table verification helpers

pub mod fixtures;
mod verification;

pub use fixtures::*;
pub use verification::*;
