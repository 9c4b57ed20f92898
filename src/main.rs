//! Command-line interface for daq-confgen
//!
//! # Usage Examples
//!
//! ## Generators
//! ```bash
//! # Fake readout, one data link, software TP generation
//! daq-confgen fake-readout --enable-software-tpg fake_readout.json
//!
//! # Mini DAQ at 0.5 Hz with the writer holding the initial tokens
//! daq-confgen minidaq -t 0.5 -c -10 minidaq-app-fake-readout.json
//!
//! # Print every command block while generating
//! daq-confgen minidaq --echo
//! ```
//!
//! ## Balancer
//! ```bash
//! daq-confgen balance --process daq_application --pinfile pins.json
//! daq-confgen balance -p daq_application -f pins.json --output-format json
//! ```

use clap::Parser;
use daq_confgen::commands::{balance, generate};
use daq_confgen::{is_balance_invocation, Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // The balancer treats bad arguments as a no-op run
        Err(e) if is_balance_invocation(std::env::args_os()) => {
            let _ = e.print();
            std::process::exit(0);
        }
        Err(e) => e.exit(),
    };

    match cli.command {
        Commands::FakeReadout(args) => generate::run_fake_readout(args),
        Commands::Minidaq(args) => generate::run_minidaq(args),
        Commands::Balance(args) => balance::run_balance(args),
    }
}
