use std::io::Write;
use std::sync::Arc;

use super::{Command, CommandError, Flow};
use crate::jobs::JobControl;

#[derive(Clone)]
pub struct QuitCommand {
    control: Arc<JobControl>,
}

impl QuitCommand {
    pub fn new(control: Arc<JobControl>) -> Self {
        Self { control }
    }
}

impl Command for QuitCommand {
    fn execute(&self, _args: &[String], out: &mut dyn Write) -> Result<Flow, CommandError> {
        let table = self.control.lock()?;
        if !table.has_stopped() {
            return Ok(Flow::Quit);
        }

        writeln!(out, "There are jobs which are stopped!! Terminate them")?;
        writeln!(out, "Use kill -9 <pid>")?;
        table.write_list(out)?;
        out.flush()?;
        Ok(Flow::Continue)
    }
}
