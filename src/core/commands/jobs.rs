use std::io::Write;
use std::sync::Arc;

use super::{Command, CommandError, Flow};
use crate::jobs::JobControl;

#[derive(Clone)]
pub struct JobsCommand {
    control: Arc<JobControl>,
}

impl JobsCommand {
    pub fn new(control: Arc<JobControl>) -> Self {
        Self { control }
    }
}

impl Command for JobsCommand {
    fn execute(&self, _args: &[String], out: &mut dyn Write) -> Result<Flow, CommandError> {
        self.control.lock()?.write_list(out)?;
        out.flush()?;
        Ok(Flow::Continue)
    }
}
