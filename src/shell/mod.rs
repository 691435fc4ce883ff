use std::io::{self, Write};
use std::sync::Arc;

use log::{debug, warn};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

mod executor;

use crate::{
    config::Config,
    core::commands::{CommandExecutor, Flow},
    error::ShellError,
    jobs::JobControl,
    process::signal,
};

use executor::CommandHandler;

pub struct Shell {
    pub(crate) editor: DefaultEditor,
    pub(crate) config: Config,
    pub(crate) executor: CommandExecutor,
}

impl Shell {
    pub fn new(config: Config) -> Result<Self, ShellError> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = config.history_path() {
            if let Err(e) = editor.load_history(path) {
                debug!("no history loaded from {}: {}", path.display(), e);
            }
        }

        let control = Arc::new(JobControl::new());
        signal::setup_signal_handlers(Arc::clone(&control))?;
        let executor = CommandExecutor::new(Arc::clone(&control));

        Ok(Shell {
            editor,
            config,
            executor,
        })
    }

    /// Read-eval loop. Returns on end of input or `quit`.
    pub fn run(&mut self) -> Result<(), ShellError> {
        loop {
            let prompt = self.config.prompt().to_string();
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    if self.config.emit_prompt() && !line.trim().is_empty() {
                        if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                            warn!("Couldn't add to history: {}", e);
                        }
                    }

                    match self.execute_command(&line) {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => println!("{}", e),
                    }
                    io::stdout().flush()?;
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl-C at the prompt: nothing is running, start over
                    println!();
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        self.save_history();
        Ok(())
    }

    fn save_history(&mut self) {
        if let Some(path) = self.config.history_path() {
            if let Err(e) = self.editor.save_history(path) {
                warn!("Couldn't save history to {}: {}", path.display(), e);
            }
        }
    }
}
