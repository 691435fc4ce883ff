use std::fmt;
use std::io;

use libc::c_int;

use crate::jobs::{JobError, Pid};

pub mod executor;
pub mod reaper;
pub mod signal;

pub use executor::ProcessLauncher;
pub use reaper::{reap_children, ReapEvent};

#[derive(Debug)]
pub enum ProcessError {
    EmptyCommand,
    CommandNotFound(String),
    Spawn(io::Error),
    Signal {
        pid: Pid,
        signal: c_int,
        source: io::Error,
    },
    Jobs(JobError),
    Io(io::Error),
}

impl From<io::Error> for ProcessError {
    fn from(e: io::Error) -> Self {
        ProcessError::Io(e)
    }
}

impl From<JobError> for ProcessError {
    fn from(e: JobError) -> Self {
        ProcessError::Jobs(e)
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::EmptyCommand => write!(f, "empty command"),
            ProcessError::CommandNotFound(cmd) => write!(f, "{}: Command not found", cmd),
            ProcessError::Spawn(e) => write!(f, "fork error: {}", e),
            ProcessError::Signal {
                pid,
                signal,
                source,
            } => write!(f, "kill ({}, signal {}) failed: {}", pid, signal, source),
            ProcessError::Jobs(e) => write!(f, "{}", e),
            ProcessError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ProcessError {}

/// Sends `signal` to every process in the group led by `pid`.
pub fn signal_group(pid: Pid, signal: c_int) -> Result<(), ProcessError> {
    // SAFETY: kill has no memory-safety preconditions.
    let rc = unsafe { libc::kill(-pid, signal) };
    if rc < 0 {
        return Err(ProcessError::Signal {
            pid: -pid,
            signal,
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}
