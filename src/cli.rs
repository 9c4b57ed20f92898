//! Top-level command-line definition.

use clap::{Parser, Subcommand};
use readout_confgen::{FakeReadoutArgs, MiniDaqArgs};
use std::ffi::{OsStr, OsString};
use thread_balancer::BalanceArgs;

#[derive(Parser)]
#[command(name = "daq-confgen")]
#[command(about = "Command document generators and CPU affinity balancer for DAQ applications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the fake readout application command sequence
    FakeReadout(FakeReadoutArgs),

    /// Generate the mini DAQ application command sequence
    Minidaq(MiniDaqArgs),

    /// Pin threads of running applications to CPUs from a mapping file
    Balance(BalanceArgs),
}

/// Whether the raw process arguments select the `balance` subcommand.
///
/// Works on `OsString`s so that non-UTF-8 arguments never panic.
pub fn is_balance_invocation<I>(args: I) -> bool
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter().nth(1).as_deref() == Some(OsStr::new("balance"))
}
