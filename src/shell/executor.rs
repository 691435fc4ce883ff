use std::io;

use crate::core::commands::Flow;
use crate::error::ShellError;
use crate::input::parse_line;

pub(crate) trait CommandHandler {
    fn execute_command(&mut self, command: &str) -> Result<Flow, ShellError>;
}

impl CommandHandler for super::Shell {
    fn execute_command(&mut self, command: &str) -> Result<Flow, ShellError> {
        let parsed = parse_line(command);
        if parsed.is_empty() {
            return Ok(Flow::Continue);
        }

        // Unlocked handle: the reaper prints to stdout while a foreground
        // job is being waited on.
        let mut out = io::stdout();
        Ok(self.executor.execute(&parsed, command.trim(), &mut out)?)
    }
}
