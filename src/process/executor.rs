use std::io::{self, Write};
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::sync::Arc;

use log::debug;

use super::{signal_group, ProcessError};
use crate::jobs::{Job, JobControl, JobError, JobState, JobTable, Pid};

pub struct ProcessLauncher {
    control: Arc<JobControl>,
}

impl ProcessLauncher {
    pub fn new(control: Arc<JobControl>) -> Self {
        ProcessLauncher { control }
    }

    /// Starts `argv` in a fresh process group and registers it as a job.
    ///
    /// Background jobs are announced on `out`; foreground jobs block the
    /// caller until they exit, die or stop. Returns the job as registered.
    pub fn launch(
        &self,
        argv: &[String],
        background: bool,
        command_line: &str,
        out: &mut dyn Write,
    ) -> Result<Job, ProcessError> {
        let (program, args) = argv.split_first().ok_or(ProcessError::EmptyCommand)?;
        let state = if background {
            JobState::Background
        } else {
            JobState::Foreground
        };

        let job = {
            // Held until the job is registered, and for a background job
            // until it is announced, so the reaper cannot get there first.
            let mut table = self.control.lock()?;
            let pid = spawn(program, args)?;
            let job = register(&mut table, pid, state, command_line)?;
            if background {
                writeln!(out, "{}", job)?;
                out.flush()?;
            }
            job
        };

        if !background {
            self.control.wait_foreground(job.pid)?;
        }
        Ok(job)
    }
}

fn spawn(program: &str, args: &[String]) -> Result<Pid, ProcessError> {
    let child = Command::new(program)
        .args(args)
        .process_group(0)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| {
            if is_exec_failure(&e) {
                ProcessError::CommandNotFound(program.to_string())
            } else {
                ProcessError::Spawn(e)
            }
        })?;

    // Dropping the handle neither waits nor kills; the reaper owns the child now.
    Ok(child.id() as Pid)
}

/// Whether `spawn` failed because the program could not be executed,
/// as opposed to the process never being created.
fn is_exec_failure(err: &io::Error) -> bool {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => true,
        _ => matches!(
            err.raw_os_error(),
            Some(libc::ENOEXEC | libc::EISDIR | libc::ENOTDIR | libc::ELOOP | libc::ENAMETOOLONG)
        ),
    }
}

fn register(
    table: &mut JobTable,
    pid: Pid,
    state: JobState,
    command_line: &str,
) -> Result<Job, ProcessError> {
    match table.allocate(pid, state, command_line) {
        Ok(jid) => {
            debug!("Added job [{}] {} {}", jid, pid, command_line);
            table
                .find_by_jid(jid)
                .cloned()
                .ok_or(ProcessError::Jobs(JobError::InvalidPid(pid)))
        }
        Err(e) => {
            discard(pid);
            Err(e.into())
        }
    }
}

/// Kills and collects a child that could not be given a job slot.
fn discard(pid: Pid) {
    if let Err(e) = signal_group(pid, libc::SIGKILL) {
        debug!("discarding ({}): {}", pid, e);
    }
    let mut status = 0;
    // SAFETY: status points to a live local.
    unsafe {
        libc::waitpid(pid, &mut status, 0);
    }
}
