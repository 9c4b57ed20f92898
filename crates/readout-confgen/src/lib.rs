//! Command document generators for DAQ readout applications.
//!
//! Each generator turns a handful of scalar parameters into the full
//! lifecycle command sequence of one application flavour:
//!
//! ```text
//! params ──► TopologyBuilder ──► Init (queues sorted by name)
//!   │                                │
//!   └──► ClockModel ──► payloads ────┴──► [init, conf, start, stop, ..., scrap]
//!                                                    │
//!                                                    ▼
//!                                          render_document (JSON)
//! ```
//!
//! ## Variants
//!
//! - **fake-readout**: fake card reader feeding one data link handler per link,
//!   optional trigger-primitive links and software TP generation.
//! - **minidaq**: trigger decision emulator, request generator, fragment
//!   receiver, data writer, readout and raw data recorders.
//!
//! ## Quick Start
//!
//! ```bash
//! daq-confgen fake-readout -n 2 -s 10 fake_readout.json
//! daq-confgen minidaq -n 2 --trigger-rate-hz 1.0 minidaq-app-fake-readout.json
//! ```

pub mod cli;
pub mod clock;
pub mod config;
pub mod generator;
pub mod render;
pub mod topology;

pub use cli::*;
pub use clock::*;
pub use config::*;
pub use generator::*;
pub use render::*;
pub use topology::*;
