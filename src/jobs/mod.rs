use std::fmt;
use std::io::{self, Write};

pub mod control;

pub use control::{JobControl, FG_POLL_INTERVAL};

pub type Pid = libc::pid_t;
pub type Jid = u32;

/// Maximum number of jobs tracked at any point in time.
pub const MAX_JOBS: usize = 16;

/// Command text capacity reserved for every slot up front.
pub const MAX_LINE: usize = 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobState {
    #[default]
    Undefined,
    Foreground,
    Background,
    Stopped,
}

impl JobState {
    pub fn label(&self) -> &'static str {
        match self {
            JobState::Undefined => "Undefined",
            JobState::Foreground => "Foreground",
            JobState::Background => "Running",
            JobState::Stopped => "Stopped",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Job {
    pub pid: Pid,
    pub jid: Jid,
    pub state: JobState,
    pub command_line: String,
}

impl Job {
    fn empty() -> Self {
        Job {
            command_line: String::with_capacity(MAX_LINE),
            ..Default::default()
        }
    }

    pub fn is_free(&self) -> bool {
        self.pid == 0
    }

    fn clear(&mut self) {
        self.pid = 0;
        self.jid = 0;
        self.state = JobState::Undefined;
        self.command_line.clear();
    }
}

/// Renders the launch notice, `[jid] (pid)   command line`.
impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ({})   {}", self.jid, self.pid, self.command_line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    TooManyJobs,
    InvalidPid(Pid),
    Poisoned,
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::TooManyJobs => write!(f, "Tried to create too many jobs"),
            JobError::InvalidPid(pid) => write!(f, "Invalid pid: {}", pid),
            JobError::Poisoned => write!(f, "Job table lock poisoned"),
        }
    }
}

impl std::error::Error for JobError {}

/// Fixed-capacity job list. Slots are allocated once, at construction.
#[derive(Debug)]
pub struct JobTable {
    slots: [Job; MAX_JOBS],
    next_jid: Jid,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        JobTable {
            slots: std::array::from_fn(|_| Job::empty()),
            next_jid: 1,
        }
    }

    /// Registers a job in the first free slot and returns its jid.
    pub fn allocate(
        &mut self,
        pid: Pid,
        state: JobState,
        command_line: &str,
    ) -> Result<Jid, JobError> {
        if pid < 1 {
            return Err(JobError::InvalidPid(pid));
        }

        let jid = self.next_jid;
        let slot = self
            .slots
            .iter_mut()
            .find(|job| job.is_free())
            .ok_or(JobError::TooManyJobs)?;

        slot.pid = pid;
        slot.jid = jid;
        slot.state = state;
        slot.command_line.clear();
        slot.command_line.push_str(command_line);
        self.next_jid += 1;
        Ok(jid)
    }

    /// Clears the slot holding `pid`. Returns false when no such job exists.
    pub fn release(&mut self, pid: Pid) -> bool {
        if pid < 1 {
            return false;
        }

        match self.slots.iter_mut().find(|job| job.pid == pid) {
            Some(job) => {
                job.clear();
                self.next_jid = self.max_jid() + 1;
                true
            }
            None => false,
        }
    }

    pub fn find_by_pid(&self, pid: Pid) -> Option<&Job> {
        if pid < 1 {
            return None;
        }
        self.slots.iter().find(|job| job.pid == pid)
    }

    pub fn find_by_pid_mut(&mut self, pid: Pid) -> Option<&mut Job> {
        if pid < 1 {
            return None;
        }
        self.slots.iter_mut().find(|job| job.pid == pid)
    }

    pub fn find_by_jid(&self, jid: Jid) -> Option<&Job> {
        if jid < 1 {
            return None;
        }
        self.slots.iter().find(|job| job.jid == jid)
    }

    pub fn find_by_jid_mut(&mut self, jid: Jid) -> Option<&mut Job> {
        if jid < 1 {
            return None;
        }
        self.slots.iter_mut().find(|job| job.jid == jid)
    }

    pub fn foreground_pid(&self) -> Option<Pid> {
        self.list()
            .find(|job| job.state == JobState::Foreground)
            .map(|job| job.pid)
    }

    /// Live jobs in slot order.
    pub fn list(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().filter(|job| !job.is_free())
    }

    pub fn has_stopped(&self) -> bool {
        self.list().any(|job| job.state == JobState::Stopped)
    }

    pub fn len(&self) -> usize {
        self.list().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn next_jid(&self) -> Jid {
        self.next_jid
    }

    pub fn write_list(&self, out: &mut dyn Write) -> io::Result<()> {
        for job in self.list() {
            writeln!(
                out,
                "[{}] ({}) {} {}",
                job.jid,
                job.pid,
                job.state.label(),
                job.command_line
            )?;
        }
        Ok(())
    }

    fn max_jid(&self) -> Jid {
        self.list().map(|job| job.jid).max().unwrap_or(0)
    }
}
