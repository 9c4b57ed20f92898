//! CPU affinity balancer for running DAQ applications.
//!
//! Finds processes whose name contains a substring, resolves each process's
//! application name from its `--name` argument and pins every thread listed
//! in the mapping file to its CPU set:
//!
//! ```text
//! pinfile.json ──► PinMap ─────────────┐
//!                                      ▼
//! ProcessTable ──► processes ──► threads ──► lookup(app, thread)
//!                                      │
//!                                      ▼
//!                        set_affinity ──► ThreadOutcome ──► BalanceReport
//! ```
//!
//! The OS side sits behind [`ProcessTable`], so the balancing logic runs
//! unchanged against an in-memory table in tests.

pub mod balancer;
pub mod cli;
pub mod environment;
pub mod net;
pub mod pinfile;
pub mod process;
pub mod report;

pub use balancer::{app_identifier, BalanceReport, Balancer, LookupMiss, ThreadOutcome, ThreadReport};
pub use cli::{BalanceArgs, OutputFormat};
pub use environment::{log_host_environment, HostEnvironment};
pub use net::{parse_net_table, Connection, Protocol};
pub use pinfile::{PinMap, PinMapError};
pub use process::{AffinityError, ProcessInfo, ProcessTable, SystemProcessTable, ThreadInfo};
pub use report::{format_json, format_table};
