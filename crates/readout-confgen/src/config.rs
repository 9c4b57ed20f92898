//! Generator parameters and fixed constants.

use serde::{Deserialize, Serialize};

/// Local clock speed of the readout electronics.
pub const CLOCK_SPEED_HZ: u64 = 50_000_000;

/// Time a module waits on a queue pop, in milliseconds.
pub const QUEUE_POP_WAIT_MS: u64 = 100;

/// Frames the fake card reader replays before wrapping.
pub const FAKE_READER_INPUT_LIMIT: u64 = 10_485_100;

/// Raw-link queue depth.
pub const LINK_QUEUE_CAPACITY: u64 = 100_000;

/// Shared time-sync and fragment queue depth.
pub const SHARED_QUEUE_CAPACITY: u64 = 100;

/// Parameters of the fake readout application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeReadoutParams {
    /// Number of data links
    pub data_producers: u32,
    /// Number of trigger-primitive links, numbered after the data links
    pub tp_producers: u32,
    /// Factor by which to slow the emulated data rate
    pub data_rate_slowdown_factor: f64,
    pub run_number: u64,
    /// Raw frame file replayed on every data link
    pub data_file: String,
    /// Raw TP frame file replayed on every TP link
    pub tp_data_file: String,
    /// Generate trigger primitives in software from every data link
    pub enable_software_tpg: bool,
}

impl Default for FakeReadoutParams {
    fn default() -> Self {
        Self {
            data_producers: 1,
            tp_producers: 0,
            data_rate_slowdown_factor: 10.0,
            run_number: 333,
            data_file: "./frames.bin".to_string(),
            tp_data_file: "./tp_frames.bin".to_string(),
            enable_software_tpg: false,
        }
    }
}

/// Parameters of the mini DAQ application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniDaqParams {
    /// Number of data links
    pub data_producers: u32,
    /// Run the data link handlers in emulator mode
    pub emulator_mode: bool,
    pub data_rate_slowdown_factor: f64,
    pub run_number: u64,
    /// Trigger rate in wall-clock Hz
    pub trigger_rate_hz: f64,
    pub data_file: String,
    /// Directory of the HDF5 output files
    pub output_path: String,
    pub disable_data_storage: bool,
    /// Positive: tokens held by the trigger emulator. Negative: tokens held by the writer.
    pub token_count: i64,
    /// Directory of the per-link raw recordings
    pub recording_dir: String,
    /// Emit a `record` command of this many seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_duration_s: Option<u32>,
}

impl Default for MiniDaqParams {
    fn default() -> Self {
        Self {
            data_producers: 2,
            emulator_mode: false,
            data_rate_slowdown_factor: 10.0,
            run_number: 333,
            trigger_rate_hz: 1.0,
            data_file: "./frames.bin".to_string(),
            output_path: ".".to_string(),
            disable_data_storage: false,
            token_count: 10,
            recording_dir: "/mnt/micron1".to_string(),
            record_duration_s: None,
        }
    }
}

/// Initial token counts of the trigger emulator and the data writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSplit {
    pub trigger_emulator: i64,
    pub data_writer: i64,
}

impl TokenSplit {
    pub fn from_token_count(token_count: i64) -> Self {
        if token_count > 0 {
            Self {
                trigger_emulator: token_count,
                data_writer: 0,
            }
        } else {
            Self {
                trigger_emulator: 0,
                data_writer: -token_count,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let fake = FakeReadoutParams::default();
        assert_eq!(fake.data_producers, 1);
        assert_eq!(fake.tp_producers, 0);
        assert_eq!(fake.run_number, 333);

        let minidaq = MiniDaqParams::default();
        assert_eq!(minidaq.data_producers, 2);
        assert_eq!(minidaq.token_count, 10);
        assert!(minidaq.record_duration_s.is_none());
    }

    #[test]
    fn test_token_split() {
        assert_eq!(
            TokenSplit::from_token_count(10),
            TokenSplit {
                trigger_emulator: 10,
                data_writer: 0
            }
        );
        assert_eq!(
            TokenSplit::from_token_count(-4),
            TokenSplit {
                trigger_emulator: 0,
                data_writer: 4
            }
        );
        assert_eq!(
            TokenSplit::from_token_count(0),
            TokenSplit {
                trigger_emulator: 0,
                data_writer: 0
            }
        );
    }
}
