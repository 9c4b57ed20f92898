//! The static topology carried by the `init` command.

use crate::module::ModSpec;
use crate::queue::{Direction, QueueSpec};
use crate::registry::SchemaRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Error type for topology checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// Two queues share a name
    #[error("Duplicate queue: {0}")]
    DuplicateQueue(String),

    /// Two modules share a name
    #[error("Duplicate module: {0}")]
    DuplicateModule(String),

    /// A connection references a queue that is not declared
    #[error("Module '{module}' connection '{connection}' references unknown queue '{queue}'")]
    UnknownQueue {
        module: String,
        connection: String,
        queue: String,
    },

    /// A single-producer queue has more than one writer
    #[error("Queue '{queue}' is single-producer but is written by {producers:?}")]
    MultipleProducers {
        queue: String,
        producers: Vec<String>,
    },

    /// A module uses a plugin the schema does not know
    #[error("Module '{module}' uses unknown plugin '{plugin}'")]
    UnknownPlugin { module: String, plugin: String },
}

/// Queues and modules of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Init {
    pub queues: Vec<QueueSpec>,
    pub modules: Vec<ModSpec>,
}

impl Init {
    /// Build an init document with queues in canonical (name) order.
    pub fn new(mut queues: Vec<QueueSpec>, modules: Vec<ModSpec>) -> Self {
        queues.sort_by(|a, b| a.inst.cmp(&b.inst));
        Self { queues, modules }
    }

    /// Get a queue by name.
    pub fn queue(&self, inst: &str) -> Option<&QueueSpec> {
        self.queues.iter().find(|q| q.inst == inst)
    }

    /// Get a module by name.
    pub fn module(&self, inst: &str) -> Option<&ModSpec> {
        self.modules.iter().find(|m| m.inst == inst)
    }

    /// Names of all modules, in declaration order.
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.inst.as_str()).collect()
    }

    /// Whether queues are in strictly increasing name order.
    pub fn is_canonically_ordered(&self) -> bool {
        self.queues.windows(2).all(|w| w[0].inst < w[1].inst)
    }

    /// Check the structural invariants of the topology.
    ///
    /// Queue and module names are unique, every connection references a
    /// declared queue, single-producer queues have at most one writer and
    /// every plugin is known to `registry`.
    pub fn validate(&self, registry: &SchemaRegistry) -> Result<(), TopologyError> {
        let mut queues = HashMap::new();
        for queue in &self.queues {
            if queues.insert(queue.inst.as_str(), queue).is_some() {
                return Err(TopologyError::DuplicateQueue(queue.inst.clone()));
            }
        }

        let mut module_names = HashSet::new();
        let mut producers: HashMap<&str, Vec<String>> = HashMap::new();

        for module in &self.modules {
            if !module_names.insert(module.inst.as_str()) {
                return Err(TopologyError::DuplicateModule(module.inst.clone()));
            }
            if !registry.has_plugin(&module.plugin) {
                return Err(TopologyError::UnknownPlugin {
                    module: module.inst.clone(),
                    plugin: module.plugin.clone(),
                });
            }

            for qinfo in module.connections() {
                if !queues.contains_key(qinfo.inst.as_str()) {
                    return Err(TopologyError::UnknownQueue {
                        module: module.inst.clone(),
                        connection: qinfo.name.clone(),
                        queue: qinfo.inst.clone(),
                    });
                }
                if qinfo.dir == Direction::Output {
                    producers
                        .entry(qinfo.inst.as_str())
                        .or_default()
                        .push(module.inst.clone());
                }
            }
        }

        // Report in queue order so errors are deterministic
        for queue in &self.queues {
            if queue.kind.is_multi_producer() {
                continue;
            }
            if let Some(writers) = producers.get(queue.inst.as_str()) {
                if writers.len() > 1 {
                    return Err(TopologyError::MultipleProducers {
                        queue: queue.inst.clone(),
                        producers: writers.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{QueueInfo, QueueKind};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builtin()
    }

    fn two_link_init() -> Init {
        Init::new(
            vec![
                QueueSpec::new("wib_fake_link_1", QueueKind::FollySpsc, 100000),
                QueueSpec::new("time_sync_q", QueueKind::FollyMpmc, 100),
                QueueSpec::new("wib_fake_link_0", QueueKind::FollySpsc, 100000),
            ],
            vec![
                ModSpec::new(
                    "fake_source",
                    "FakeCardReader",
                    vec![
                        QueueInfo::output("output_0", "wib_fake_link_0"),
                        QueueInfo::output("output_1", "wib_fake_link_1"),
                    ],
                ),
                ModSpec::new(
                    "datahandler_0",
                    "DataLinkHandler",
                    vec![
                        QueueInfo::input("raw_input", "wib_fake_link_0"),
                        QueueInfo::output("timesync", "time_sync_q"),
                    ],
                ),
                ModSpec::new(
                    "datahandler_1",
                    "DataLinkHandler",
                    vec![
                        QueueInfo::input("raw_input", "wib_fake_link_1"),
                        QueueInfo::output("timesync", "time_sync_q"),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn test_new_sorts_queues() {
        let init = two_link_init();
        let names: Vec<&str> = init.queues.iter().map(|q| q.inst.as_str()).collect();
        assert_eq!(
            names,
            vec!["time_sync_q", "wib_fake_link_0", "wib_fake_link_1"]
        );
        assert!(init.is_canonically_ordered());
    }

    #[test]
    fn test_valid_topology_with_shared_queue() {
        // Two handlers write the MPMC time sync queue
        assert_eq!(two_link_init().validate(&registry()), Ok(()));
    }

    #[test]
    fn test_rejects_unknown_queue() {
        let mut init = two_link_init();
        init.modules[0]
            .data
            .qinfos
            .push(QueueInfo::output("tp_output_2", "fake_link_2"));

        let err = init.validate(&registry()).unwrap_err();
        assert_eq!(
            err,
            TopologyError::UnknownQueue {
                module: "fake_source".to_string(),
                connection: "tp_output_2".to_string(),
                queue: "fake_link_2".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_second_producer_on_spsc_queue() {
        let mut init = two_link_init();
        init.modules[2]
            .data
            .qinfos
            .push(QueueInfo::output("loopback", "wib_fake_link_0"));

        match init.validate(&registry()).unwrap_err() {
            TopologyError::MultipleProducers { queue, producers } => {
                assert_eq!(queue, "wib_fake_link_0");
                assert_eq!(producers, vec!["fake_source", "datahandler_1"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut init = two_link_init();
        init.queues.push(init.queues[0].clone());
        assert!(matches!(
            init.validate(&registry()),
            Err(TopologyError::DuplicateQueue(_))
        ));

        let mut init = two_link_init();
        init.modules.push(init.modules[1].clone());
        assert_eq!(
            init.validate(&registry()),
            Err(TopologyError::DuplicateModule("datahandler_0".to_string()))
        );
    }

    #[test]
    fn test_rejects_unknown_plugin() {
        let mut init = two_link_init();
        init.modules[0].plugin = "CardReaderDAQModule".to_string();
        assert!(matches!(
            init.validate(&registry()),
            Err(TopologyError::UnknownPlugin { .. })
        ));
    }
}
