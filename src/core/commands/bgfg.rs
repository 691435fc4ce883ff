use std::io::Write;
use std::sync::Arc;

use super::{Command, CommandError, Flow};
use crate::jobs::{Jid, Job, JobControl, JobState, JobTable, Pid};
use crate::process::signal_group;

/// How a job is identified on the `fg`/`bg` command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTarget {
    Pid(Pid),
    Jid(Jid),
}

impl JobTarget {
    /// Accepts `N` (a pid) or `%N` (a job id).
    pub fn parse(arg: &str) -> Option<Self> {
        match arg.strip_prefix('%') {
            Some(jid) if is_number(jid) => Some(JobTarget::Jid(jid.parse().unwrap_or(0))),
            Some(_) => None,
            // out-of-range values become 0, which never matches a job
            None if is_number(arg) => Some(JobTarget::Pid(arg.parse().unwrap_or(0))),
            None => None,
        }
    }
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeMode {
    Foreground,
    Background,
}

impl ResumeMode {
    pub fn name(&self) -> &'static str {
        match self {
            ResumeMode::Foreground => "fg",
            ResumeMode::Background => "bg",
        }
    }
}

/// The `fg` and `bg` builtins.
#[derive(Clone)]
pub struct ResumeCommand {
    mode: ResumeMode,
    control: Arc<JobControl>,
}

impl ResumeCommand {
    pub fn new(mode: ResumeMode, control: Arc<JobControl>) -> Self {
        Self { mode, control }
    }

    fn lookup<'a>(&self, table: &'a mut JobTable, arg: &str) -> Result<&'a mut Job, CommandError> {
        let target = JobTarget::parse(arg)
            .ok_or_else(|| CommandError::InvalidArgument(self.mode.name().to_string()))?;

        match target {
            JobTarget::Pid(pid) => table
                .find_by_pid_mut(pid)
                .ok_or_else(|| CommandError::NoSuchProcess(arg.to_string())),
            JobTarget::Jid(jid) => table
                .find_by_jid_mut(jid)
                .ok_or_else(|| CommandError::NoSuchJob(arg.trim_start_matches('%').to_string())),
        }
    }

    /// Applies the state transition and returns the pid to wait on, if any.
    fn transition(&self, job: &mut Job, out: &mut dyn Write) -> Result<Option<Pid>, CommandError> {
        match (self.mode, job.state) {
            (ResumeMode::Foreground, JobState::Stopped) => {
                signal_group(job.pid, libc::SIGCONT)?;
                job.state = JobState::Foreground;
                Ok(Some(job.pid))
            }
            (ResumeMode::Foreground, JobState::Background) => {
                job.state = JobState::Foreground;
                Ok(Some(job.pid))
            }
            (ResumeMode::Background, JobState::Stopped) => {
                signal_group(job.pid, libc::SIGCONT)?;
                job.state = JobState::Background;
                writeln!(out, "{}", job)?;
                Ok(None)
            }
            (ResumeMode::Background, JobState::Background) => {
                writeln!(out, "Job [{}] already in background", job.jid)?;
                Ok(None)
            }
            (mode, state) => Err(CommandError::Internal(format!(
                "{} reached job [{}] ({}) in state {:?}",
                mode.name(),
                job.jid,
                job.pid,
                state
            ))),
        }
    }
}

impl Command for ResumeCommand {
    fn execute(&self, args: &[String], out: &mut dyn Write) -> Result<Flow, CommandError> {
        let arg = args
            .first()
            .ok_or_else(|| CommandError::MissingArgument(self.mode.name().to_string()))?;

        let waiting_on = {
            // The reaper cannot run while this is held, so the job seen here is
            // the job that gets signalled.
            let mut table = self.control.lock()?;
            let job = self.lookup(&mut table, arg)?;
            self.transition(job, out)?
        };
        out.flush()?;

        if let Some(pid) = waiting_on {
            self.control.wait_foreground(pid)?;
        }
        Ok(Flow::Continue)
    }
}
