use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use log::debug;

use super::{JobError, JobState, JobTable, Pid};

/// Upper bound on a single foreground wait before the table is checked again.
pub const FG_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared handle to the job table.
///
/// The main loop, the reaper and the keyboard relays all hold an
/// `Arc<JobControl>`. Whoever changes a job's state away from
/// `Foreground` calls [`JobControl::notify`] so a blocked
/// [`JobControl::wait_foreground`] can return promptly.
#[derive(Debug, Default)]
pub struct JobControl {
    table: Mutex<JobTable>,
    changed: Condvar,
}

impl JobControl {
    pub fn new() -> Self {
        JobControl {
            table: Mutex::new(JobTable::new()),
            changed: Condvar::new(),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, JobTable>, JobError> {
        self.table.lock().map_err(|_| JobError::Poisoned)
    }

    pub fn notify(&self) {
        self.changed.notify_all();
    }

    pub fn foreground_pid(&self) -> Result<Option<Pid>, JobError> {
        Ok(self.lock()?.foreground_pid())
    }

    /// Blocks until `pid` is no longer the foreground job.
    pub fn wait_foreground(&self, pid: Pid) -> Result<(), JobError> {
        let mut table = self.lock()?;
        while is_foreground(&table, pid) {
            let (guard, _) = self
                .changed
                .wait_timeout(table, FG_POLL_INTERVAL)
                .map_err(|_| JobError::Poisoned)?;
            table = guard;
        }
        debug!("waitfg: ({}) Process no longer the fg process", pid);
        Ok(())
    }
}

fn is_foreground(table: &JobTable, pid: Pid) -> bool {
    table
        .find_by_pid(pid)
        .is_some_and(|job| job.state == JobState::Foreground)
}
