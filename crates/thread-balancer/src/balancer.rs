//! Per-thread affinity application.

use crate::pinfile::PinMap;
use crate::process::{AffinityError, ProcessInfo, ProcessTable, ThreadInfo};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Application name of a process: the token following `--name`.
pub fn app_identifier(cmdline: &[String]) -> Option<&str> {
    let idx = cmdline.iter().position(|arg| arg == "--name")?;
    cmdline.get(idx + 1).map(String::as_str)
}

/// Why a thread had no CPU set in the mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMiss {
    /// The process has no `--name` argument
    NoAppName,
    UnknownApp(String),
    UnknownThread { app: String, thread: String },
}

impl std::fmt::Display for LookupMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupMiss::NoAppName => write!(f, "no --name argument"),
            LookupMiss::UnknownApp(app) => write!(f, "app '{app}' not in pin file"),
            LookupMiss::UnknownThread { app, thread } => {
                write!(f, "thread '{thread}' not listed for '{app}'")
            }
        }
    }
}

/// What happened to one thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ThreadOutcome {
    Applied { cpus: BTreeSet<usize> },
    /// Affinity left unchanged
    NotFound(LookupMiss),
    PermissionDenied,
    Failed(String),
}

/// One thread of a matched process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadReport {
    pub pid: u32,
    pub process: String,
    pub app: Option<String>,
    pub tid: u32,
    pub thread: String,
    /// Affinity before balancing, when it could be read
    pub previous: Option<BTreeSet<usize>>,
    pub outcome: ThreadOutcome,
}

/// Result of one balancing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BalanceReport {
    pub process_filter: String,
    pub processes_matched: usize,
    pub threads: Vec<ThreadReport>,
}

impl BalanceReport {
    fn count(&self, pred: impl Fn(&ThreadOutcome) -> bool) -> usize {
        self.threads.iter().filter(|t| pred(&t.outcome)).count()
    }

    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, ThreadOutcome::Applied { .. }))
    }

    pub fn not_found(&self) -> usize {
        self.count(|o| matches!(o, ThreadOutcome::NotFound(_)))
    }

    pub fn denied(&self) -> usize {
        self.count(|o| matches!(o, ThreadOutcome::PermissionDenied))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ThreadOutcome::Failed(_)))
    }

    /// Outcome for the thread called `thread`, if any was seen.
    pub fn outcome_for(&self, thread: &str) -> Option<&ThreadOutcome> {
        self.threads
            .iter()
            .find(|t| t.thread == thread)
            .map(|t| &t.outcome)
    }
}

/// Applies a [`PinMap`] to the threads of matching processes.
pub struct Balancer<'a, T: ProcessTable + ?Sized> {
    table: &'a T,
    pins: &'a PinMap,
}

impl<'a, T: ProcessTable + ?Sized> Balancer<'a, T> {
    pub fn new(table: &'a T, pins: &'a PinMap) -> Self {
        Self { table, pins }
    }

    /// Pin every mapped thread of processes whose name contains `process_name`.
    ///
    /// Per-thread failures are recorded in the report; none abort the pass.
    pub fn run(&self, process_name: &str) -> BalanceReport {
        let mut report = BalanceReport {
            process_filter: process_name.to_string(),
            ..Default::default()
        };

        for process in self
            .table
            .processes()
            .into_iter()
            .filter(|p| p.name.contains(process_name))
        {
            report.processes_matched += 1;
            self.balance_process(&process, &mut report);
        }

        if report.processes_matched == 0 {
            warn!("No process matching '{}' found", process_name);
        }
        info!(
            "Balanced {} threads: {} applied, {} not found, {} denied, {} failed",
            report.threads.len(),
            report.applied(),
            report.not_found(),
            report.denied(),
            report.failed()
        );
        report
    }

    fn balance_process(&self, process: &ProcessInfo, report: &mut BalanceReport) {
        info!("Found '{}' pid {}", process.name, process.pid);
        info!("  command line: {:?}", process.cmdline);
        info!("  memory: {} MB", process.memory_bytes / 1024 / 1024);
        let connections = self.table.connections(process.pid);
        info!("  connections: {}", connections.len());
        for connection in &connections {
            info!("    {}", connection);
        }

        let app = app_identifier(&process.cmdline);
        for thread in self.table.threads(process.pid) {
            let previous = match self.table.affinity(thread.tid) {
                Ok(cpus) => Some(cpus),
                Err(e) => {
                    debug!("Cannot read affinity of thread {}: {}", thread.tid, e);
                    None
                }
            };

            let outcome = self.balance_thread(app, &thread);
            info!(
                "  thread {} '{}': {:?} -> {:?}",
                thread.tid, thread.name, previous, outcome
            );

            report.threads.push(ThreadReport {
                pid: process.pid,
                process: process.name.clone(),
                app: app.map(str::to_string),
                tid: thread.tid,
                thread: thread.name,
                previous,
                outcome,
            });
        }
    }

    fn lookup(&self, app: Option<&str>, thread: &str) -> Result<&BTreeSet<usize>, LookupMiss> {
        let app = app.ok_or(LookupMiss::NoAppName)?;
        if !self.pins.has_app(app) {
            return Err(LookupMiss::UnknownApp(app.to_string()));
        }
        self.pins
            .lookup(app, thread)
            .ok_or_else(|| LookupMiss::UnknownThread {
                app: app.to_string(),
                thread: thread.to_string(),
            })
    }

    fn balance_thread(&self, app: Option<&str>, thread: &ThreadInfo) -> ThreadOutcome {
        let cpus = match self.lookup(app, &thread.name) {
            Ok(cpus) => cpus,
            Err(miss) => return ThreadOutcome::NotFound(miss),
        };
        if cpus.is_empty() {
            return ThreadOutcome::Failed("empty CPU set".to_string());
        }

        match self.table.set_affinity(thread.tid, cpus) {
            Ok(()) => ThreadOutcome::Applied { cpus: cpus.clone() },
            Err(AffinityError::PermissionDenied { .. }) => ThreadOutcome::PermissionDenied,
            Err(e) => ThreadOutcome::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_app_identifier() {
        assert_eq!(
            app_identifier(&args(&["daq_application", "--name", "appA", "-c", "x"])),
            Some("appA")
        );
        assert_eq!(app_identifier(&args(&["daq_application", "--name"])), None);
        assert_eq!(app_identifier(&args(&["daq_application"])), None);
        assert_eq!(
            app_identifier(&args(&["x", "--name", "first", "--name", "second"])),
            Some("first")
        );
    }

    #[test]
    fn test_lookup_miss_display() {
        let miss = LookupMiss::UnknownThread {
            app: "appA".into(),
            thread: "threadY".into(),
        };
        assert_eq!(miss.to_string(), "thread 'threadY' not listed for 'appA'");
    }

    #[test]
    fn test_outcome_serialization() {
        let applied = serde_json::to_value(ThreadOutcome::Applied {
            cpus: BTreeSet::from([0, 1]),
        })
        .unwrap();
        assert_eq!(applied["status"], "applied");
        assert_eq!(applied["detail"]["cpus"], serde_json::json!([0, 1]));

        let denied = serde_json::to_value(ThreadOutcome::PermissionDenied).unwrap();
        assert_eq!(denied["status"], "permission_denied");
    }
}
