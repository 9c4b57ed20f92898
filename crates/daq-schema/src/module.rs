//! Module declarations.

use crate::queue::{Direction, QueueInfo};
use serde::{Deserialize, Serialize};

/// Initialisation data handed to a module: its queue connections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModInit {
    pub qinfos: Vec<QueueInfo>,
}

/// A named processing unit and the plugin implementing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModSpec {
    /// Unique module instance name
    pub inst: String,
    /// Runtime implementation
    pub plugin: String,
    pub data: ModInit,
}

impl ModSpec {
    pub fn new(inst: impl Into<String>, plugin: impl Into<String>, qinfos: Vec<QueueInfo>) -> Self {
        Self {
            inst: inst.into(),
            plugin: plugin.into(),
            data: ModInit { qinfos },
        }
    }

    /// Connections of the module, in declaration order.
    pub fn connections(&self) -> &[QueueInfo] {
        &self.data.qinfos
    }

    /// Find a connection by its local name.
    pub fn connection(&self, name: &str) -> Option<&QueueInfo> {
        self.data.qinfos.iter().find(|q| q.name == name)
    }

    /// Queues this module writes into.
    pub fn outputs(&self) -> impl Iterator<Item = &QueueInfo> {
        self.data
            .qinfos
            .iter()
            .filter(|q| q.dir == Direction::Output)
    }
}
