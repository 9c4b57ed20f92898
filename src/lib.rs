//! daq-confgen
//!
//! Generates the JSON lifecycle command documents that drive DAQ readout
//! applications and pins the threads of running applications to CPUs.
//!
//! # CLI Usage
//!
//! ```bash
//! # Fake readout with two data links and one TP link
//! daq-confgen fake-readout -n 2 -t 1 fake_readout.json
//!
//! # Mini DAQ writing HDF5 files to /data and recording for 10 s
//! daq-confgen minidaq -n 2 -o /data --record-duration 10
//!
//! # Pin threads of running applications
//! daq-confgen balance -p daq_application -f pins.json
//! ```

pub mod cli;
pub mod commands;

pub use cli::{is_balance_invocation, Cli, Commands};
