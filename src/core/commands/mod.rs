use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;

mod bgfg;
mod jobs;
mod quit;

pub use bgfg::{JobTarget, ResumeCommand, ResumeMode};
pub use jobs::JobsCommand;
pub use quit::QuitCommand;

use crate::input::ParsedLine;
use crate::jobs::{JobControl, JobError};
use crate::process::{ProcessError, ProcessLauncher};

#[derive(Debug)]
pub enum CommandError {
    MissingArgument(String),
    InvalidArgument(String),
    NoSuchProcess(String),
    NoSuchJob(String),
    Internal(String),
    IoError(io::Error),
    ProcessError(ProcessError),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::MissingArgument(cmd) => {
                write!(f, "{} command requires PID or %jobid argument", cmd)
            }
            CommandError::InvalidArgument(cmd) => {
                write!(f, "{}: argument must be a PID or %jobid", cmd)
            }
            CommandError::NoSuchProcess(pid) => write!(f, "({}): No such process", pid),
            CommandError::NoSuchJob(jid) => write!(f, "%{}: No such job", jid),
            CommandError::Internal(msg) => write!(f, "Internal error: {}", msg),
            CommandError::IoError(err) => write!(f, "IO error: {}", err),
            CommandError::ProcessError(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<io::Error> for CommandError {
    fn from(err: io::Error) -> Self {
        CommandError::IoError(err)
    }
}

impl From<ProcessError> for CommandError {
    fn from(err: ProcessError) -> Self {
        CommandError::ProcessError(err)
    }
}

impl From<JobError> for CommandError {
    fn from(err: JobError) -> Self {
        CommandError::ProcessError(ProcessError::Jobs(err))
    }
}

/// What the read loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub trait Command {
    fn execute(&self, args: &[String], out: &mut dyn Write) -> Result<Flow, CommandError>;
}

#[derive(Clone)]
enum CommandType {
    Quit(QuitCommand),
    Jobs(JobsCommand),
    Resume(ResumeCommand),
}

impl Command for CommandType {
    fn execute(&self, args: &[String], out: &mut dyn Write) -> Result<Flow, CommandError> {
        match self {
            CommandType::Quit(cmd) => cmd.execute(args, out),
            CommandType::Jobs(cmd) => cmd.execute(args, out),
            CommandType::Resume(cmd) => cmd.execute(args, out),
        }
    }
}

/// Routes a parsed line to a builtin or to the process launcher.
pub struct CommandExecutor {
    commands: BTreeMap<String, CommandType>,
    launcher: ProcessLauncher,
}

impl CommandExecutor {
    pub fn new(control: Arc<JobControl>) -> Self {
        let mut commands = BTreeMap::new();
        commands.insert(
            "quit".to_string(),
            CommandType::Quit(QuitCommand::new(Arc::clone(&control))),
        );
        commands.insert(
            "jobs".to_string(),
            CommandType::Jobs(JobsCommand::new(Arc::clone(&control))),
        );
        commands.insert(
            "fg".to_string(),
            CommandType::Resume(ResumeCommand::new(
                ResumeMode::Foreground,
                Arc::clone(&control),
            )),
        );
        commands.insert(
            "bg".to_string(),
            CommandType::Resume(ResumeCommand::new(
                ResumeMode::Background,
                Arc::clone(&control),
            )),
        );

        CommandExecutor {
            commands,
            launcher: ProcessLauncher::new(control),
        }
    }

    pub fn execute(
        &self,
        line: &ParsedLine,
        command_line: &str,
        out: &mut dyn Write,
    ) -> Result<Flow, CommandError> {
        let Some((name, args)) = line.argv.split_first() else {
            return Ok(Flow::Continue);
        };

        if let Some(cmd) = self.commands.get(name) {
            return cmd.execute(args, out);
        }

        self.launcher
            .launch(&line.argv, line.background, command_line, out)?;
        Ok(Flow::Continue)
    }

    #[cfg(test)]
    fn is_builtin(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }
}
