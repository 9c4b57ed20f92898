//! Topology assembly.
//!
//! Generators declare queues and modules in whatever order reads best; the
//! builder puts queues in canonical name order and checks the wiring before
//! handing out the [`Init`] document.

use daq_schema::{Init, ModSpec, QueueInfo, QueueKind, QueueSpec, SchemaRegistry, TopologyError};
use tracing::debug;

/// Incremental builder for an [`Init`] document.
pub struct TopologyBuilder<'a> {
    registry: &'a SchemaRegistry,
    queues: Vec<QueueSpec>,
    modules: Vec<ModSpec>,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            queues: Vec::new(),
            modules: Vec::new(),
        }
    }

    /// Declare one queue.
    pub fn queue(&mut self, inst: impl Into<String>, kind: QueueKind, capacity: u64) -> &mut Self {
        self.queues.push(QueueSpec::new(inst, kind, capacity));
        self
    }

    /// Declare one queue per index, named by `name`.
    pub fn queues_per_index<F>(
        &mut self,
        indices: std::ops::Range<u32>,
        kind: QueueKind,
        capacity: u64,
        name: F,
    ) -> &mut Self
    where
        F: Fn(u32) -> String,
    {
        for idx in indices {
            self.queues.push(QueueSpec::new(name(idx), kind, capacity));
        }
        self
    }

    /// Declare one module.
    pub fn module(
        &mut self,
        inst: impl Into<String>,
        plugin: &str,
        qinfos: Vec<QueueInfo>,
    ) -> &mut Self {
        self.modules.push(ModSpec::new(inst, plugin, qinfos));
        self
    }

    /// Sort queues and check the wiring.
    pub fn build(self) -> Result<Init, TopologyError> {
        let init = Init::new(self.queues, self.modules);
        init.validate(self.registry)?;
        debug!(
            "Built topology with {} queues and {} modules",
            init.queues.len(),
            init.modules.len()
        );
        Ok(init)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sorts_and_validates() {
        let registry = SchemaRegistry::builtin();
        let mut builder = TopologyBuilder::new(&registry);
        builder
            .queue("time_sync_q", QueueKind::FollyMpmc, 100)
            .queues_per_index(0..3, QueueKind::FollySpsc, 1000, |i| {
                format!("data_requests_{i}")
            })
            .module(
                "datahandler_0",
                "DataLinkHandler",
                vec![
                    QueueInfo::output("timesync", "time_sync_q"),
                    QueueInfo::input("requests", "data_requests_0"),
                ],
            );

        let init = builder.build().unwrap();
        let names: Vec<&str> = init.queues.iter().map(|q| q.inst.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "data_requests_0",
                "data_requests_1",
                "data_requests_2",
                "time_sync_q"
            ]
        );
    }

    #[test]
    fn test_builder_reports_dangling_connection() {
        let registry = SchemaRegistry::builtin();
        let mut builder = TopologyBuilder::new(&registry);
        builder.module(
            "fake_source",
            "FakeCardReader",
            vec![QueueInfo::output("output_0", "wib_fake_link_0")],
        );

        assert!(matches!(
            builder.build(),
            Err(TopologyError::UnknownQueue { .. })
        ));
    }
}
