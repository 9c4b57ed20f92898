//! Mini DAQ application: emulated triggers drive data requests to the
//! readout, fragments are built into trigger records and written to HDF5.

use crate::clock::ClockModel;
use crate::config::{
    MiniDaqParams, TokenSplit, FAKE_READER_INPUT_LIMIT, LINK_QUEUE_CAPACITY, QUEUE_POP_WAIT_MS,
    SHARED_QUEUE_CAPACITY,
};
use crate::generator::ConfigGenerator;
use crate::topology::TopologyBuilder;
use anyhow::{Context, Result};
use daq_schema::payload::{
    DataLinkHandlerConf, DataRecorderConf, DataWriterConf, FakeCardReaderConf,
    FragmentReceiverConf, GeoIdInst, Hdf5DataStoreConf, Hdf5FileLayoutParams,
    Hdf5FileNameParams, RecordingParams, RequestGeneratorConf, StartParams,
    TriggerDecisionEmulatorConf, TriggerDecisionEmulatorResume,
};
use daq_schema::{
    AddressedCmd, Command, CommandSequence, Init, ModulePattern, QueueInfo, QueueKind,
    RunState, SchemaError, SchemaRegistry, TopologyError,
};
use tracing::{debug, info};

/// Dataflow queues hold only a handful of in-flight decisions.
const DATAFLOW_QUEUE_CAPACITY: u64 = 20;

const READOUT_WINDOW_TICKS: u64 = 1200;
const TRIGGER_WINDOW_OFFSET: u64 = 1000;
const MAX_FILE_SIZE_BYTES: u64 = 1_073_741_824;
const RECORDER_STREAM_BUFFER_SIZE: u64 = 8_388_608;

/// Generator for the mini DAQ application.
#[derive(Debug, Clone, Default)]
pub struct MiniDaqGenerator {
    pub params: MiniDaqParams,
}

fn exact(name: &str) -> ModulePattern {
    ModulePattern::exact(name)
}

impl MiniDaqGenerator {
    pub fn new(params: MiniDaqParams) -> Self {
        Self { params }
    }

    fn links(&self) -> std::ops::Range<u32> {
        0..self.params.data_producers
    }

    fn clock(&self) -> ClockModel {
        ClockModel::new(self.params.data_rate_slowdown_factor)
    }

    fn trigger_interval_ticks(&self) -> i64 {
        self.clock()
            .trigger_interval_ticks(self.params.trigger_rate_hz)
    }

    /// Build the queues and modules.
    pub fn topology(&self, registry: &SchemaRegistry) -> Result<Init, TopologyError> {
        let mut builder = TopologyBuilder::new(registry);

        builder
            .queue("time_sync_q", QueueKind::FollyMpmc, SHARED_QUEUE_CAPACITY)
            .queue("token_q", QueueKind::FollySpsc, DATAFLOW_QUEUE_CAPACITY)
            .queue("trigger_decision_q", QueueKind::FollySpsc, DATAFLOW_QUEUE_CAPACITY)
            .queue(
                "trigger_decision_copy_for_bookkeeping",
                QueueKind::FollySpsc,
                DATAFLOW_QUEUE_CAPACITY,
            )
            .queue("trigger_record_q", QueueKind::FollySpsc, DATAFLOW_QUEUE_CAPACITY)
            .queue("data_fragments_q", QueueKind::FollyMpmc, SHARED_QUEUE_CAPACITY)
            .queues_per_index(self.links(), QueueKind::FollySpsc, DATAFLOW_QUEUE_CAPACITY, |i| {
                format!("data_requests_{i}")
            })
            .queues_per_index(self.links(), QueueKind::FollySpsc, LINK_QUEUE_CAPACITY, |i| {
                format!("wib_fake_link_{i}")
            })
            .queues_per_index(self.links(), QueueKind::FollySpsc, LINK_QUEUE_CAPACITY, |i| {
                format!("snb_link_{i}")
            });

        builder.module(
            "tde",
            "TriggerDecisionEmulator",
            vec![
                QueueInfo::input("time_sync_source", "time_sync_q"),
                QueueInfo::input("token_source", "token_q"),
                QueueInfo::output("trigger_decision_sink", "trigger_decision_q"),
            ],
        );

        let mut rqg_qinfos = vec![
            QueueInfo::input("trigger_decision_input_queue", "trigger_decision_q"),
            QueueInfo::output(
                "trigger_decision_for_event_building",
                "trigger_decision_copy_for_bookkeeping",
            ),
        ];
        rqg_qinfos.extend(self.links().map(|i| {
            QueueInfo::output(
                format!("data_request_{i}_output_queue"),
                format!("data_requests_{i}"),
            )
        }));
        builder.module("rqg", "RequestGenerator", rqg_qinfos);

        builder
            .module(
                "ffr",
                "FragmentReceiver",
                vec![
                    QueueInfo::input(
                        "trigger_decision_input_queue",
                        "trigger_decision_copy_for_bookkeeping",
                    ),
                    QueueInfo::output("trigger_record_output_queue", "trigger_record_q"),
                    QueueInfo::input("data_fragment_input_queue", "data_fragments_q"),
                ],
            )
            .module(
                "datawriter",
                "DataWriter",
                vec![
                    QueueInfo::input("trigger_record_input_queue", "trigger_record_q"),
                    QueueInfo::output("token_output_queue", "token_q"),
                ],
            )
            .module(
                "fake_source",
                "FakeCardReader",
                self.links()
                    .map(|i| QueueInfo::output(format!("output_{i}"), format!("wib_fake_link_{i}")))
                    .collect(),
            );

        for i in self.links() {
            builder.module(
                format!("datahandler_{i}"),
                "DataLinkHandler",
                vec![
                    QueueInfo::input("raw_input", format!("wib_fake_link_{i}")),
                    QueueInfo::output("timesync", "time_sync_q"),
                    QueueInfo::input("requests", format!("data_requests_{i}")),
                    QueueInfo::output("fragments", "data_fragments_q"),
                    QueueInfo::output("snb", format!("snb_link_{i}")),
                ],
            );
        }
        for i in self.links() {
            builder.module(
                format!("data_recorder_{i}"),
                "DataRecorder",
                vec![QueueInfo::input("snb", format!("snb_link_{i}"))],
            );
        }

        builder.build()
    }

    fn data_writer_conf(&self, initial_token_count: i64) -> DataWriterConf {
        DataWriterConf {
            initial_token_count,
            data_store_parameters: Hdf5DataStoreConf {
                name: "data_store".to_string(),
                store_type: "HDF5DataStore".to_string(),
                directory_path: self.params.output_path.clone(),
                mode: "all-per-file".to_string(),
                max_file_size_bytes: MAX_FILE_SIZE_BYTES,
                filename_parameters: Hdf5FileNameParams {
                    overall_prefix: "swtest".to_string(),
                    digits_for_run_number: 6,
                    file_index_prefix: String::new(),
                    digits_for_file_index: 4,
                },
                file_layout_parameters: Hdf5FileLayoutParams {
                    trigger_record_name_prefix: "TriggerRecord".to_string(),
                    digits_for_trigger_number: 5,
                    digits_for_apa_number: 3,
                    digits_for_link_number: 2,
                },
            },
        }
    }

    fn conf_command(&self) -> Result<Command, SchemaError> {
        let params = &self.params;
        let clock = self.clock();
        let tokens = TokenSplit::from_token_count(params.token_count);
        let links: Vec<u32> = self.links().collect();

        let tde = TriggerDecisionEmulatorConf {
            links: links.clone(),
            min_links_in_request: params.data_producers,
            max_links_in_request: params.data_producers,
            min_readout_window_ticks: READOUT_WINDOW_TICKS,
            max_readout_window_ticks: READOUT_WINDOW_TICKS,
            trigger_window_offset: TRIGGER_WINDOW_OFFSET,
            trigger_delay_ticks: clock.trigger_delay_ticks(),
            // Scaled so triggers stay one per wall-clock period despite the slowdown
            trigger_interval_ticks: self.trigger_interval_ticks(),
            clock_frequency_hz: clock.clock_frequency_hz(),
            initial_token_count: tokens.trigger_emulator,
        };

        let rqg = RequestGeneratorConf {
            map: self
                .links()
                .map(|i| GeoIdInst {
                    apa: 0,
                    link: i,
                    queueinstance: format!("data_requests_{i}"),
                })
                .collect(),
        };

        let source = FakeCardReaderConf {
            link_ids: links,
            input_limit: FAKE_READER_INPUT_LIMIT,
            rate_khz: clock.rate_khz(),
            raw_type: "wib".to_string(),
            data_filename: params.data_file.clone(),
            queue_timeout_ms: QUEUE_POP_WAIT_MS,
            set_t0_to: None,
            tp_enabled: None,
            tp_rate_khz: None,
            tp_data_filename: None,
        };

        let mut modules = vec![
            AddressedCmd::new(exact("tde"), &tde)?,
            AddressedCmd::new(exact("rqg"), &rqg)?,
            AddressedCmd::new(
                exact("ffr"),
                &FragmentReceiverConf {
                    general_queue_timeout: QUEUE_POP_WAIT_MS,
                },
            )?,
            AddressedCmd::new(exact("datawriter"), &self.data_writer_conf(tokens.data_writer))?,
            AddressedCmd::new(exact("fake_source"), &source)?,
        ];

        for i in self.links() {
            let handler = DataLinkHandlerConf {
                raw_type: "wib".to_string(),
                emulator_mode: Some(params.emulator_mode),
                source_queue_timeout_ms: QUEUE_POP_WAIT_MS,
                fake_trigger_flag: 0,
                latency_buffer_size: clock.latency_buffer_size(),
                pop_limit_pct: 0.8,
                pop_size_pct: 0.1,
                apa_number: 0,
                link_number: i,
                enable_software_tpg: None,
            };
            modules.push(AddressedCmd::new(
                ModulePattern::exact(format!("datahandler_{i}")),
                &handler,
            )?);
        }

        for i in self.links() {
            let recorder = DataRecorderConf {
                output_file: format!(
                    "{}/output_{i}.out",
                    params.recording_dir.trim_end_matches('/')
                ),
                compression_algorithm: "None".to_string(),
                stream_buffer_size: RECORDER_STREAM_BUFFER_SIZE,
            };
            modules.push(AddressedCmd::new(
                ModulePattern::exact(format!("data_recorder_{i}")),
                &recorder,
            )?);
        }

        Ok(Command::modules("conf", modules).with_states(RunState::Initial, RunState::Configured))
    }

    fn start_command(&self) -> Result<Command, SchemaError> {
        let start = StartParams {
            run: self.params.run_number,
            trigger_interval_ticks: Some(self.trigger_interval_ticks()),
            disable_data_storage: Some(self.params.disable_data_storage),
        };
        let targets = [
            exact("datawriter"),
            exact("ffr"),
            ModulePattern::pattern("datahandler_.*")?,
            ModulePattern::pattern("data_recorder_.*")?,
            exact("fake_source"),
            exact("rqg"),
            exact("tde"),
        ];

        let mut modules = Vec::with_capacity(targets.len());
        for target in targets {
            modules.push(AddressedCmd::new(target, &start)?);
        }
        Ok(Command::modules("start", modules).with_states(RunState::Configured, RunState::Running))
    }

    fn stop_command(&self) -> Result<Command, SchemaError> {
        // Upstream first so in-flight data drains downstream
        let targets = [
            exact("tde"),
            exact("rqg"),
            exact("fake_source"),
            ModulePattern::pattern("datahandler_.*")?,
            exact("ffr"),
            exact("datawriter"),
            ModulePattern::pattern("data_recorder_.*")?,
        ];
        Ok(Command::modules(
            "stop",
            targets.into_iter().map(AddressedCmd::empty).collect(),
        )
        .with_states(RunState::Running, RunState::Configured))
    }

    fn pause_command(&self) -> Command {
        Command::modules("pause", vec![AddressedCmd::empty(ModulePattern::any())])
            .with_states(RunState::Running, RunState::Running)
    }

    fn resume_command(&self) -> Result<Command, SchemaError> {
        let resume = TriggerDecisionEmulatorResume {
            trigger_interval_ticks: self.trigger_interval_ticks(),
        };
        Ok(
            Command::modules("resume", vec![AddressedCmd::new(exact("tde"), &resume)?])
                .with_states(RunState::Running, RunState::Running),
        )
    }

    fn record_command(&self, duration: u32) -> Result<Command, SchemaError> {
        Ok(Command::modules(
            "record",
            vec![AddressedCmd::new(
                ModulePattern::pattern("datahandler_.*")?,
                &RecordingParams { duration },
            )?],
        )
        .with_states(RunState::Running, RunState::Running))
    }

    fn scrap_command(&self) -> Command {
        Command::modules("scrap", vec![AddressedCmd::empty(ModulePattern::any())])
            .with_states(RunState::Configured, RunState::Initial)
    }
}

impl ConfigGenerator for MiniDaqGenerator {
    fn generate(&self, registry: &SchemaRegistry) -> Result<CommandSequence> {
        info!(
            "Generating mini DAQ: {} links, slowdown {}, trigger rate {} Hz, run {}",
            self.params.data_producers,
            self.params.data_rate_slowdown_factor,
            self.params.trigger_rate_hz,
            self.params.run_number
        );

        let init = self
            .topology(registry)
            .context("Failed to build mini DAQ topology")?;
        info!(
            "Topology: {} queues, {} modules",
            init.queues.len(),
            init.modules.len()
        );

        let mut commands = vec![
            Command::init(init).with_states(RunState::None, RunState::Initial),
            self.conf_command()?,
            self.start_command()?,
            self.stop_command()?,
            self.pause_command(),
            self.resume_command()?,
        ];
        if let Some(duration) = self.params.record_duration_s {
            commands.push(self.record_command(duration)?);
        }
        commands.push(self.scrap_command());

        let sequence = CommandSequence::new(commands);
        registry
            .check_sequence(&sequence)
            .context("Generated command sequence does not match the plugin schema")?;

        debug!("Commands: {:?}", sequence.ids());
        Ok(sequence)
    }

    fn default_filename(&self) -> &str {
        "minidaq-app-fake-readout.json"
    }
}
