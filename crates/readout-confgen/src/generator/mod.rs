//! Command sequence generators.
//!
//! This module provides one generator per application flavour.

pub mod fake_readout;
pub mod minidaq;

use anyhow::Result;
use daq_schema::{CommandSequence, SchemaRegistry};

/// Trait for command sequence generators.
pub trait ConfigGenerator {
    /// Generate the full command sequence against a plugin schema.
    fn generate(&self, registry: &SchemaRegistry) -> Result<CommandSequence>;

    /// Get the default output filename for this generator.
    fn default_filename(&self) -> &str;
}

pub use fake_readout::FakeReadoutGenerator;
pub use minidaq::MiniDaqGenerator;
