//! Access to live processes, their threads and thread CPU affinity.

use crate::net::{self, Connection};
use std::collections::{BTreeMap, BTreeSet};
use sysinfo::{Pid, System};
use tracing::debug;

/// A running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cmdline: Vec<String>,
    /// Resident memory in bytes
    pub memory_bytes: u64,
}

/// A thread of a running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub tid: u32,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AffinityError {
    #[error("Permission denied changing affinity of thread {tid}")]
    PermissionDenied { tid: u32 },

    #[error("Thread {tid} no longer exists")]
    NoSuchThread { tid: u32 },

    #[error("CPU {cpu} is out of range")]
    InvalidCpu { cpu: usize },

    #[error("Affinity call for thread {tid} failed: {message}")]
    Os { tid: u32, message: String },

    #[error("Thread affinity is not supported on this platform")]
    Unsupported,
}

/// Process and thread enumeration plus affinity control.
pub trait ProcessTable {
    /// All live processes (not threads).
    fn processes(&self) -> Vec<ProcessInfo>;

    /// Threads of process `pid`.
    fn threads(&self, pid: u32) -> Vec<ThreadInfo>;

    /// Sockets held by process `pid`. Only logged.
    fn connections(&self, _pid: u32) -> Vec<Connection> {
        Vec::new()
    }

    /// Current CPU set of thread `tid`.
    fn affinity(&self, tid: u32) -> Result<BTreeSet<usize>, AffinityError>;

    /// Restrict thread `tid` to `cpus`.
    fn set_affinity(&self, tid: u32, cpus: &BTreeSet<usize>) -> Result<(), AffinityError>;
}

/// [`ProcessTable`] backed by `sysinfo` for enumeration and
/// `sched_{get,set}affinity` for CPU sets.
pub struct SystemProcessTable {
    system: System,
}

impl SystemProcessTable {
    /// Snapshot the process table.
    pub fn new() -> Self {
        let system = System::new_all();
        debug!("Process table snapshot: {} entries", system.processes().len());
        Self { system }
    }
}

impl Default for SystemProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SystemProcessTable {
    fn processes(&self) -> Vec<ProcessInfo> {
        let mut processes: Vec<ProcessInfo> = self
            .system
            .processes()
            .values()
            // Linux lists tasks alongside their process
            .filter(|p| p.thread_kind().is_none())
            .map(|p| ProcessInfo {
                pid: p.pid().as_u32(),
                name: p.name().to_string_lossy().into_owned(),
                cmdline: p
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy().into_owned())
                    .collect(),
                memory_bytes: p.memory(),
            })
            .collect();
        processes.sort_by_key(|p| p.pid);
        processes
    }

    fn threads(&self, pid: u32) -> Vec<ThreadInfo> {
        let Some(process) = self.system.process(Pid::from_u32(pid)) else {
            return Vec::new();
        };

        // The main thread shares the pid and is not always among the tasks
        let mut threads = BTreeMap::from([(
            pid,
            ThreadInfo {
                tid: pid,
                name: process.name().to_string_lossy().into_owned(),
            },
        )]);
        for tid in process.tasks().into_iter().flatten() {
            let Some(task) = self.system.process(*tid) else {
                continue;
            };
            threads.insert(
                tid.as_u32(),
                ThreadInfo {
                    tid: tid.as_u32(),
                    name: task.name().to_string_lossy().into_owned(),
                },
            );
        }
        threads.into_values().collect()
    }

    fn connections(&self, pid: u32) -> Vec<Connection> {
        net::process_connections(pid)
    }

    fn affinity(&self, tid: u32) -> Result<BTreeSet<usize>, AffinityError> {
        sched::get(tid)
    }

    fn set_affinity(&self, tid: u32, cpus: &BTreeSet<usize>) -> Result<(), AffinityError> {
        sched::set(tid, cpus)
    }
}

#[cfg(target_os = "linux")]
mod sched {
    use super::AffinityError;
    use nix::errno::Errno;
    use nix::sched::{sched_getaffinity, sched_setaffinity, CpuSet};
    use nix::unistd::Pid;
    use std::collections::BTreeSet;

    fn map_errno(tid: u32, errno: Errno) -> AffinityError {
        match errno {
            Errno::EPERM => AffinityError::PermissionDenied { tid },
            Errno::ESRCH => AffinityError::NoSuchThread { tid },
            other => AffinityError::Os {
                tid,
                message: other.desc().to_string(),
            },
        }
    }

    pub fn get(tid: u32) -> Result<BTreeSet<usize>, AffinityError> {
        let set = sched_getaffinity(Pid::from_raw(tid as i32)).map_err(|e| map_errno(tid, e))?;
        Ok((0..CpuSet::count())
            .filter(|cpu| set.is_set(*cpu).unwrap_or(false))
            .collect())
    }

    pub fn set(tid: u32, cpus: &BTreeSet<usize>) -> Result<(), AffinityError> {
        let mut set = CpuSet::new();
        for &cpu in cpus {
            set.set(cpu).map_err(|_| AffinityError::InvalidCpu { cpu })?;
        }
        sched_setaffinity(Pid::from_raw(tid as i32), &set).map_err(|e| map_errno(tid, e))
    }
}

#[cfg(not(target_os = "linux"))]
mod sched {
    use super::AffinityError;
    use std::collections::BTreeSet;

    pub fn get(_tid: u32) -> Result<BTreeSet<usize>, AffinityError> {
        Err(AffinityError::Unsupported)
    }

    pub fn set(_tid: u32, _cpus: &BTreeSet<usize>) -> Result<(), AffinityError> {
        Err(AffinityError::Unsupported)
    }
}
