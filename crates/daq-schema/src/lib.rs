//! Typed command documents for DAQ readout applications.
//!
//! A DAQ application is driven by a fixed sequence of lifecycle commands.
//! The first one, `init`, carries the static topology: the queues and the
//! modules wired to them. Every later command carries a list of payloads,
//! each addressed to one module or to a group of modules by pattern.
//!
//! ```text
//! Command "init"  ──► Init { queues: [QueueSpec], modules: [ModSpec] }
//!                                              │
//!                                              └─► ModInit { qinfos: [QueueInfo] }
//!
//! Command "conf"  ──► CmdObj { modules: [AddressedCmd { match, data }] }
//! Command "start" ──► ...
//! ```
//!
//! Field names mirror the schema of the consuming runtime and must not be
//! renamed. Plugin knowledge (which runtime implementations exist and which
//! commands they accept) lives in an explicit [`SchemaRegistry`] handle.
//!
//! # Example
//!
//! ```rust
//! use daq_schema::{ModulePattern, QueueKind, QueueSpec};
//!
//! let queue = QueueSpec::new("time_sync_q", QueueKind::FollyMpmc, 100);
//! assert!(queue.kind.is_multi_producer());
//!
//! let handlers = ModulePattern::pattern("datahandler_.*").unwrap();
//! assert!(handlers.matches("datahandler_3"));
//! assert!(!handlers.matches("fake_source"));
//! ```

pub mod command;
pub mod init;
pub mod module;
pub mod payload;
pub mod queue;
pub mod registry;

pub use command::{
    AddressedCmd, CmdObj, Command, CommandData, CommandSequence, ModulePattern, ModuleRegex, RunState,
};
pub use init::{Init, TopologyError};
pub use module::{ModInit, ModSpec};
pub use queue::{Direction, QueueInfo, QueueKind, QueueSpec};
pub use registry::{PluginSchema, SchemaError, SchemaRegistry};
