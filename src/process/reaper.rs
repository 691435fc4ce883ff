use std::fmt;
use std::io;

use libc::c_int;
use log::debug;

use super::ProcessError;
use crate::jobs::{Jid, JobControl, JobState, JobTable, Pid};

/// One child state change collected by [`reap_children`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReapEvent {
    Exited { jid: Jid, pid: Pid, status: c_int },
    Signaled { jid: Jid, pid: Pid, signal: c_int },
    Stopped { jid: Jid, pid: Pid, signal: c_int },
    /// The kernel reported a child the table does not know about.
    Untracked { pid: Pid, status: c_int },
}

impl ReapEvent {
    pub fn pid(&self) -> Pid {
        match self {
            ReapEvent::Exited { pid, .. }
            | ReapEvent::Signaled { pid, .. }
            | ReapEvent::Stopped { pid, .. }
            | ReapEvent::Untracked { pid, .. } => *pid,
        }
    }

    /// Whether the event is announced to the user. Normal exits are silent.
    pub fn is_announced(&self) -> bool {
        matches!(self, ReapEvent::Signaled { .. } | ReapEvent::Stopped { .. })
    }
}

impl fmt::Display for ReapEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReapEvent::Exited { jid, pid, status } => {
                write!(f, "Job [{}] ({}) terminates Ok (status {})", jid, pid, status)
            }
            ReapEvent::Signaled { jid, pid, signal } => {
                write!(f, "Job [{}] ({}) terminated by signal {}", jid, pid, signal)
            }
            ReapEvent::Stopped { jid, pid, signal } => {
                write!(f, "Job [{}] ({}) stopped by signal {}", jid, pid, signal)
            }
            ReapEvent::Untracked { pid, status } => {
                write!(f, "untracked child ({}) changed state (status {})", pid, status)
            }
        }
    }
}

/// Collects every child state change that is ready right now, without
/// blocking on children that are still running.
///
/// The table lock is held across the whole `waitpid` loop, and `report`
/// runs under it, so a launcher holding the same lock between spawn and
/// registration can never lose a child to this function. Waiters are
/// notified once the lock is released.
pub fn reap_children<F>(control: &JobControl, mut report: F) -> Result<usize, ProcessError>
where
    F: FnMut(&ReapEvent),
{
    let mut reaped = 0;
    {
        let mut table = control.lock()?;
        loop {
            let mut status: c_int = 0;
            // SAFETY: status points to a live local.
            let pid = unsafe { libc::waitpid(-1, &mut status, libc::WNOHANG | libc::WUNTRACED) };
            if pid == 0 {
                break;
            }
            if pid < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                // ECHILD: nothing left to wait for
                break;
            }

            let event = reconcile(&mut table, pid, status);
            report(&event);
            reaped += 1;
        }
    }

    if reaped > 0 {
        control.notify();
    }
    Ok(reaped)
}

fn reconcile(table: &mut JobTable, pid: Pid, status: c_int) -> ReapEvent {
    let Some(job) = table.find_by_pid_mut(pid) else {
        debug!("sigchld_handler: no job for pid ({}), skipping", pid);
        return ReapEvent::Untracked { pid, status };
    };
    let jid = job.jid;

    if libc::WIFSTOPPED(status) {
        job.state = JobState::Stopped;
        return ReapEvent::Stopped {
            jid,
            pid,
            signal: libc::WSTOPSIG(status),
        };
    }

    let event = if libc::WIFSIGNALED(status) {
        ReapEvent::Signaled {
            jid,
            pid,
            signal: libc::WTERMSIG(status),
        }
    } else if libc::WIFEXITED(status) {
        ReapEvent::Exited {
            jid,
            pid,
            status: libc::WEXITSTATUS(status),
        }
    } else {
        // WCONTINUED is never requested, so nothing else can arrive here
        return ReapEvent::Untracked { pid, status };
    };

    table.release(pid);
    debug!("sigchld_handler: Job [{}] ({}) deleted", jid, pid);
    event
}
