//! Queue declarations and the connections modules make to them.

use serde::{Deserialize, Serialize};

/// Queue implementation selected by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueKind {
    /// Multi-producer multi-consumer queue.
    #[serde(rename = "FollyMPMCQueue")]
    FollyMpmc,
    /// Single-producer single-consumer queue.
    #[serde(rename = "FollySPSCQueue")]
    FollySpsc,
    #[serde(rename = "StdDeQueue")]
    StdDeque,
}

impl QueueKind {
    /// Whether more than one module may write into a queue of this kind.
    pub fn is_multi_producer(&self) -> bool {
        matches!(self, QueueKind::FollyMpmc | QueueKind::StdDeque)
    }
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueKind::FollyMpmc => write!(f, "FollyMPMCQueue"),
            QueueKind::FollySpsc => write!(f, "FollySPSCQueue"),
            QueueKind::StdDeque => write!(f, "StdDeQueue"),
        }
    }
}

/// A named, capacity-bounded queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSpec {
    /// Unique queue instance name
    pub inst: String,
    /// Queue implementation
    pub kind: QueueKind,
    /// Maximum number of queued elements
    pub capacity: u64,
}

impl QueueSpec {
    pub fn new(inst: impl Into<String>, kind: QueueKind, capacity: u64) -> Self {
        Self {
            inst: inst.into(),
            kind,
            capacity,
        }
    }
}

/// Direction of a module's connection, seen from the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// A module's connection to a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueInfo {
    /// Name the module uses for this connection
    pub name: String,
    /// Referenced queue instance
    pub inst: String,
    /// Whether the module reads from or writes to the queue
    pub dir: Direction,
}

impl QueueInfo {
    pub fn input(name: impl Into<String>, inst: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inst: inst.into(),
            dir: Direction::Input,
        }
    }

    pub fn output(name: impl Into<String>, inst: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inst: inst.into(),
            dir: Direction::Output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_kind_wire_names() {
        let json = serde_json::to_string(&QueueKind::FollyMpmc).unwrap();
        assert_eq!(json, "\"FollyMPMCQueue\"");

        let kind: QueueKind = serde_json::from_str("\"FollySPSCQueue\"").unwrap();
        assert_eq!(kind, QueueKind::FollySpsc);
        assert_eq!(QueueKind::StdDeque.to_string(), "StdDeQueue");
    }

    #[test]
    fn test_multi_producer_kinds() {
        assert!(QueueKind::FollyMpmc.is_multi_producer());
        assert!(!QueueKind::FollySpsc.is_multi_producer());
    }

    #[test]
    fn test_queue_info_direction() {
        let info = QueueInfo::output("timesync", "time_sync_q");
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["dir"], "output");
        assert_eq!(value["inst"], "time_sync_q");
        assert_eq!(value["name"], "timesync");
    }
}
