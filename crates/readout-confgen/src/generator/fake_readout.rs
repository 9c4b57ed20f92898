//! Fake readout application: a fake card reader replaying raw frames into
//! one data link handler per link.

use crate::clock::ClockModel;
use crate::config::{
    FakeReadoutParams, FAKE_READER_INPUT_LIMIT, LINK_QUEUE_CAPACITY, QUEUE_POP_WAIT_MS,
    SHARED_QUEUE_CAPACITY,
};
use crate::generator::ConfigGenerator;
use crate::topology::TopologyBuilder;
use anyhow::{Context, Result};
use daq_schema::payload::{
    DataLinkHandlerConf, EmptyParams, FakeCardReaderConf, StartParams, TpRate,
};
use daq_schema::{
    AddressedCmd, Command, CommandSequence, Init, ModulePattern, QueueInfo, QueueKind,
    SchemaError, SchemaRegistry, TopologyError,
};
use tracing::{debug, info};

const REQUEST_QUEUE_CAPACITY: u64 = 1000;

/// Generator for the fake readout application.
#[derive(Debug, Clone, Default)]
pub struct FakeReadoutGenerator {
    pub params: FakeReadoutParams,
}

impl FakeReadoutGenerator {
    pub fn new(params: FakeReadoutParams) -> Self {
        Self { params }
    }

    fn data_links(&self) -> std::ops::Range<u32> {
        0..self.params.data_producers
    }

    /// TP links are numbered after the data links.
    fn tp_links(&self) -> std::ops::Range<u32> {
        let first = self.params.data_producers;
        first..first + self.params.tp_producers
    }

    fn clock(&self) -> ClockModel {
        ClockModel::new(self.params.data_rate_slowdown_factor)
    }

    /// Build the queues and modules.
    pub fn topology(&self, registry: &SchemaRegistry) -> Result<Init, TopologyError> {
        let sw_tpg = self.params.enable_software_tpg;
        let mut builder = TopologyBuilder::new(registry);

        builder
            .queue("time_sync_q", QueueKind::FollyMpmc, SHARED_QUEUE_CAPACITY)
            .queue("data_fragments_q", QueueKind::FollyMpmc, SHARED_QUEUE_CAPACITY)
            .queues_per_index(
                self.data_links(),
                QueueKind::FollySpsc,
                REQUEST_QUEUE_CAPACITY,
                |i| format!("data_requests_{i}"),
            )
            .queues_per_index(
                self.data_links(),
                QueueKind::FollySpsc,
                LINK_QUEUE_CAPACITY,
                |i| format!("wib_fake_link_{i}"),
            )
            .queues_per_index(
                self.tp_links(),
                QueueKind::FollySpsc,
                LINK_QUEUE_CAPACITY,
                |i| format!("tp_fake_link_{i}"),
            );

        if sw_tpg {
            builder
                .queues_per_index(
                    self.data_links(),
                    QueueKind::FollySpsc,
                    LINK_QUEUE_CAPACITY,
                    |i| format!("sw_tp_link_{i}"),
                )
                .queues_per_index(
                    self.data_links(),
                    QueueKind::FollySpsc,
                    REQUEST_QUEUE_CAPACITY,
                    |i| format!("tp_requests_{i}"),
                );
        }

        let mut source_outputs: Vec<QueueInfo> = self
            .data_links()
            .map(|i| QueueInfo::output(format!("output_{i}"), format!("wib_fake_link_{i}")))
            .collect();
        source_outputs.extend(
            self.tp_links()
                .map(|i| QueueInfo::output(format!("tp_output_{i}"), format!("tp_fake_link_{i}"))),
        );
        builder.module("fake_source", "FakeCardReader", source_outputs);

        for i in self.data_links() {
            let mut qinfos = vec![
                QueueInfo::input("raw_input", format!("wib_fake_link_{i}")),
                QueueInfo::output("timesync", "time_sync_q"),
                QueueInfo::input("requests", format!("data_requests_{i}")),
                QueueInfo::output("fragments", "data_fragments_q"),
            ];
            if sw_tpg {
                qinfos.push(QueueInfo::output("tp_out", format!("sw_tp_link_{i}")));
            }
            builder.module(format!("datahandler_{i}"), "DataLinkHandler", qinfos);
        }

        if sw_tpg {
            for i in self.data_links() {
                builder.module(
                    format!("tp_datahandler_{i}"),
                    "DataLinkHandler",
                    vec![
                        QueueInfo::input("raw_input", format!("sw_tp_link_{i}")),
                        QueueInfo::output("timesync", "time_sync_q"),
                        QueueInfo::input("requests", format!("tp_requests_{i}")),
                        QueueInfo::output("fragments", "data_fragments_q"),
                    ],
                );
            }
        }

        builder.build()
    }

    fn handler_conf(&self, raw_type: &str, link_number: u32) -> DataLinkHandlerConf {
        DataLinkHandlerConf {
            raw_type: raw_type.to_string(),
            emulator_mode: None,
            source_queue_timeout_ms: QUEUE_POP_WAIT_MS,
            fake_trigger_flag: 1,
            latency_buffer_size: self.clock().latency_buffer_size(),
            pop_limit_pct: 0.8,
            pop_size_pct: 0.1,
            apa_number: 0,
            link_number,
            enable_software_tpg: None,
        }
    }

    fn conf_command(&self) -> Result<Command, SchemaError> {
        let params = &self.params;
        let rate_khz = self.clock().rate_khz();
        let tp_enabled = params.tp_producers > 0;

        let source = FakeCardReaderConf {
            link_ids: (0..params.data_producers + params.tp_producers).collect(),
            input_limit: FAKE_READER_INPUT_LIMIT,
            rate_khz,
            raw_type: "wib".to_string(),
            data_filename: params.data_file.clone(),
            queue_timeout_ms: QUEUE_POP_WAIT_MS,
            set_t0_to: Some(0),
            tp_enabled: Some(tp_enabled.to_string()),
            tp_rate_khz: Some(if tp_enabled {
                TpRate::Khz(rate_khz)
            } else {
                TpRate::Disabled
            }),
            tp_data_filename: Some(params.tp_data_file.clone()),
        };

        let mut modules = vec![AddressedCmd::new(ModulePattern::exact("fake_source"), &source)?];

        for i in self.data_links() {
            let mut conf = self.handler_conf("wib", i);
            if params.enable_software_tpg {
                conf.enable_software_tpg = Some(true);
            }
            modules.push(AddressedCmd::new(
                ModulePattern::exact(format!("datahandler_{i}")),
                &conf,
            )?);
        }

        if params.enable_software_tpg {
            let first_sw_link = params.data_producers + params.tp_producers;
            for i in self.data_links() {
                modules.push(AddressedCmd::new(
                    ModulePattern::exact(format!("tp_datahandler_{i}")),
                    &self.handler_conf("raw_tp", first_sw_link + i),
                )?);
            }
        }

        Ok(Command::modules("conf", modules))
    }

    fn handler_patterns(&self) -> Result<Vec<ModulePattern>, SchemaError> {
        let mut patterns = vec![ModulePattern::pattern("datahandler_.*")?];
        if self.params.enable_software_tpg {
            patterns.push(ModulePattern::pattern("tp_datahandler_.*")?);
        }
        Ok(patterns)
    }

    fn start_command(&self) -> Result<Command, SchemaError> {
        let start = StartParams::run(self.params.run_number);
        let mut modules = Vec::new();
        for pattern in self.handler_patterns()? {
            modules.push(AddressedCmd::new(pattern, &start)?);
        }
        modules.push(AddressedCmd::new(ModulePattern::exact("fake_source"), &start)?);
        Ok(Command::modules("start", modules))
    }

    fn stop_command(&self) -> Result<Command, SchemaError> {
        let mut modules = vec![AddressedCmd::new(
            ModulePattern::exact("fake_source"),
            &EmptyParams {},
        )?];
        for pattern in self.handler_patterns()? {
            modules.push(AddressedCmd::new(pattern, &EmptyParams {})?);
        }
        Ok(Command::modules("stop", modules))
    }

    fn scrap_command(&self) -> Result<Command, SchemaError> {
        Ok(Command::modules(
            "scrap",
            vec![AddressedCmd::new(ModulePattern::any(), &EmptyParams {})?],
        ))
    }
}

impl ConfigGenerator for FakeReadoutGenerator {
    fn generate(&self, registry: &SchemaRegistry) -> Result<CommandSequence> {
        info!(
            "Generating fake readout: {} data links, {} TP links, slowdown {}",
            self.params.data_producers,
            self.params.tp_producers,
            self.params.data_rate_slowdown_factor
        );

        let init = self
            .topology(registry)
            .context("Failed to build fake readout topology")?;
        info!(
            "Topology: {} queues, {} modules",
            init.queues.len(),
            init.modules.len()
        );

        let sequence = CommandSequence::new(vec![
            Command::init(init),
            self.conf_command()?,
            self.start_command()?,
            self.stop_command()?,
            self.scrap_command()?,
        ]);
        registry
            .check_sequence(&sequence)
            .context("Generated command sequence does not match the plugin schema")?;

        debug!("Commands: {:?}", sequence.ids());
        Ok(sequence)
    }

    fn default_filename(&self) -> &str {
        "fake_readout.json"
    }
}
