//! Per-plugin command payloads.
//!
//! The builder treats payloads as opaque; these types only pin down field
//! names and value types so that generators cannot misspell them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Parameters without content, rendered as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyParams {}

/// Parameters of the `start` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartParams {
    pub run: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_interval_ticks: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_data_storage: Option<bool>,
}

impl StartParams {
    pub fn run(run: u64) -> Self {
        Self {
            run,
            trigger_interval_ticks: None,
            disable_data_storage: None,
        }
    }
}

/// Parameters of the `record` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingParams {
    /// Recording duration in seconds
    pub duration: u32,
}

/// Trigger-primitive replay rate of the fake card reader.
///
/// A disabled rate is written as the integer `0`, an active one as a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TpRate {
    Disabled,
    Khz(f64),
}

impl Serialize for TpRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TpRate::Disabled => serializer.serialize_u64(0),
            TpRate::Khz(rate) => serializer.serialize_f64(*rate),
        }
    }
}

impl<'de> Deserialize<'de> for TpRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let number = serde_json::Number::deserialize(deserializer)?;
        if number.as_u64() == Some(0) {
            return Ok(TpRate::Disabled);
        }
        number
            .as_f64()
            .map(TpRate::Khz)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid TP rate: {number}")))
    }
}

/// `FakeCardReader` configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeCardReaderConf {
    pub link_ids: Vec<u32>,
    pub input_limit: u64,
    pub rate_khz: f64,
    pub raw_type: String,
    pub data_filename: String,
    pub queue_timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_t0_to: Option<i64>,
    /// The reader expects the strings "true"/"false"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_enabled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_rate_khz: Option<TpRate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_data_filename: Option<String>,
}

/// `DataLinkHandler` configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataLinkHandlerConf {
    pub raw_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emulator_mode: Option<bool>,
    pub source_queue_timeout_ms: u64,
    pub fake_trigger_flag: u32,
    pub latency_buffer_size: f64,
    pub pop_limit_pct: f64,
    pub pop_size_pct: f64,
    pub apa_number: u32,
    pub link_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_software_tpg: Option<bool>,
}

/// `DataRecorder` configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRecorderConf {
    pub output_file: String,
    pub compression_algorithm: String,
    pub stream_buffer_size: u64,
}

/// `TriggerDecisionEmulator` configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDecisionEmulatorConf {
    pub links: Vec<u32>,
    pub min_links_in_request: u32,
    pub max_links_in_request: u32,
    pub min_readout_window_ticks: u64,
    pub max_readout_window_ticks: u64,
    pub trigger_window_offset: u64,
    pub trigger_delay_ticks: i64,
    pub trigger_interval_ticks: i64,
    pub clock_frequency_hz: f64,
    pub initial_token_count: i64,
}

/// `TriggerDecisionEmulator` parameters of the `resume` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDecisionEmulatorResume {
    pub trigger_interval_ticks: i64,
}

/// Maps a geographic link id to the request queue serving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoIdInst {
    pub apa: u32,
    pub link: u32,
    pub queueinstance: String,
}

/// `RequestGenerator` configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestGeneratorConf {
    pub map: Vec<GeoIdInst>,
}

/// `FragmentReceiver` configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentReceiverConf {
    pub general_queue_timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hdf5FileNameParams {
    pub overall_prefix: String,
    pub digits_for_run_number: u32,
    pub file_index_prefix: String,
    pub digits_for_file_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hdf5FileLayoutParams {
    pub trigger_record_name_prefix: String,
    pub digits_for_trigger_number: u32,
    pub digits_for_apa_number: u32,
    pub digits_for_link_number: u32,
}

/// HDF5 data store parameters embedded in the data writer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hdf5DataStoreConf {
    pub name: String,
    #[serde(rename = "type")]
    pub store_type: String,
    pub directory_path: String,
    pub mode: String,
    pub max_file_size_bytes: u64,
    pub filename_parameters: Hdf5FileNameParams,
    pub file_layout_parameters: Hdf5FileLayoutParams,
}

/// `DataWriter` configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataWriterConf {
    pub initial_token_count: i64,
    pub data_store_parameters: Hdf5DataStoreConf,
}
