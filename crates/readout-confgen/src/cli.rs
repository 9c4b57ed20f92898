//! CLI argument definitions for the generators.

use crate::config::{FakeReadoutParams, MiniDaqParams};
use clap::Args;
use std::path::PathBuf;

/// Options shared by every generator.
#[derive(Args, Clone, Debug)]
pub struct OutputArgs {
    /// Plugin schema (YAML); defaults to the built-in plugin set
    #[arg(long, env = "DAQ_CONFGEN_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Print the intermediate command blocks while generating
    #[arg(long)]
    pub echo: bool,
}

/// Arguments for the fake-readout generator.
#[derive(Args, Clone, Debug)]
pub struct FakeReadoutArgs {
    /// Number of data links
    #[arg(long, short = 'n', default_value_t = 1)]
    pub number_of_data_producers: u32,

    /// Number of trigger-primitive links
    #[arg(long, short = 't', default_value_t = 0)]
    pub number_of_tp_producers: u32,

    /// Divide all emulated data rates by this factor
    #[arg(long, short = 's', default_value_t = 10.0)]
    pub data_rate_slowdown_factor: f64,

    #[arg(long, short = 'r', default_value_t = 333)]
    pub run_number: u64,

    /// Raw WIB frames replayed by the fake card reader
    #[arg(long, short = 'd', default_value = "./frames.bin")]
    pub data_file: String,

    /// Raw TP frames replayed on the trigger-primitive links
    #[arg(long, default_value = "./tp_frames.bin")]
    pub tp_data_file: String,

    /// Generate trigger primitives in software from the data links
    #[arg(long)]
    pub enable_software_tpg: bool,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Output file
    #[arg(value_name = "JSON_FILE", default_value = "fake_readout.json")]
    pub json_file: PathBuf,
}

impl From<&FakeReadoutArgs> for FakeReadoutParams {
    fn from(args: &FakeReadoutArgs) -> Self {
        Self {
            data_producers: args.number_of_data_producers,
            tp_producers: args.number_of_tp_producers,
            data_rate_slowdown_factor: args.data_rate_slowdown_factor,
            run_number: args.run_number,
            data_file: args.data_file.clone(),
            tp_data_file: args.tp_data_file.clone(),
            enable_software_tpg: args.enable_software_tpg,
        }
    }
}

/// Arguments for the mini DAQ generator.
#[derive(Args, Clone, Debug)]
pub struct MiniDaqArgs {
    /// Number of data links
    #[arg(long, short = 'n', default_value_t = 2)]
    pub number_of_data_producers: u32,

    /// Run the data link handlers in emulator mode
    #[arg(long, short = 'e')]
    pub emulator_mode: bool,

    /// Divide all emulated data rates by this factor
    #[arg(long, short = 's', default_value_t = 10.0)]
    pub data_rate_slowdown_factor: f64,

    #[arg(long, short = 'r', default_value_t = 333)]
    pub run_number: u64,

    /// Wall-clock trigger rate
    #[arg(long, short = 't', default_value_t = 1.0)]
    pub trigger_rate_hz: f64,

    /// Raw WIB frames replayed by the fake card reader
    #[arg(long, short = 'd', default_value = "./frames.bin")]
    pub data_file: String,

    /// Directory for the HDF5 trigger record files
    #[arg(long, short = 'o', default_value = ".")]
    pub output_path: String,

    #[arg(long)]
    pub disable_data_storage: bool,

    /// Initial tokens; positive values go to the trigger emulator,
    /// otherwise their magnitude goes to the data writer
    #[arg(long, short = 'c', default_value_t = 10, allow_negative_numbers = true)]
    pub token_count: i64,

    /// Directory for raw link recordings
    #[arg(long, default_value = "/mnt/micron1")]
    pub recording_dir: String,

    /// Also emit a `record` command of this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub record_duration: Option<u32>,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Output file
    #[arg(value_name = "JSON_FILE", default_value = "minidaq-app-fake-readout.json")]
    pub json_file: PathBuf,
}

impl From<&MiniDaqArgs> for MiniDaqParams {
    fn from(args: &MiniDaqArgs) -> Self {
        Self {
            data_producers: args.number_of_data_producers,
            emulator_mode: args.emulator_mode,
            data_rate_slowdown_factor: args.data_rate_slowdown_factor,
            run_number: args.run_number,
            trigger_rate_hz: args.trigger_rate_hz,
            data_file: args.data_file.clone(),
            output_path: args.output_path.clone(),
            disable_data_storage: args.disable_data_storage,
            token_count: args.token_count,
            recording_dir: args.recording_dir.clone(),
            record_duration_s: args.record_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct FakeCli {
        #[command(flatten)]
        args: FakeReadoutArgs,
    }

    #[derive(Parser)]
    struct MiniCli {
        #[command(flatten)]
        args: MiniDaqArgs,
    }

    #[test]
    fn test_fake_readout_defaults_match_params() {
        let cli = FakeCli::try_parse_from(["fake-readout"]).unwrap();
        assert_eq!(FakeReadoutParams::from(&cli.args), FakeReadoutParams::default());
        assert_eq!(cli.args.json_file, PathBuf::from("fake_readout.json"));
        assert!(cli.args.output.schema.is_none());
    }

    #[test]
    fn test_minidaq_defaults_match_params() {
        let cli = MiniCli::try_parse_from(["minidaq"]).unwrap();
        assert_eq!(MiniDaqParams::from(&cli.args), MiniDaqParams::default());
        assert_eq!(cli.args.json_file, PathBuf::from("minidaq-app-fake-readout.json"));
    }

    #[test]
    fn test_minidaq_negative_token_count() {
        let cli = MiniCli::try_parse_from(["minidaq", "-c", "-5", "-n", "4", "out.json"]).unwrap();
        let params = MiniDaqParams::from(&cli.args);
        assert_eq!(params.token_count, -5);
        assert_eq!(params.data_producers, 4);
        assert_eq!(cli.args.json_file, PathBuf::from("out.json"));
    }

    #[test]
    fn test_fake_readout_flags() {
        let cli = FakeCli::try_parse_from([
            "fake-readout",
            "-n",
            "3",
            "-t",
            "2",
            "--enable-software-tpg",
            "--echo",
        ])
        .unwrap();
        let params = FakeReadoutParams::from(&cli.args);
        assert_eq!(params.data_producers, 3);
        assert_eq!(params.tp_producers, 2);
        assert!(params.enable_software_tpg);
        assert!(cli.args.output.echo);
    }
}
