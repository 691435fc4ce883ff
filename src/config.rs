use std::env;
use std::path::{Path, PathBuf};

use crate::flags::Flags;

pub const DEFAULT_PROMPT: &str = "tsh> ";
pub const HISTORY_FILE: &str = ".tsh_history";

/// Overrides the prompt text when set.
pub const PROMPT_VAR: &str = "TSH_PROMPT";

/// Startup settings, fixed for the lifetime of the shell.
#[derive(Debug, Clone)]
pub struct Config {
    prompt: String,
    emit_prompt: bool,
    verbose: bool,
    history_path: Option<PathBuf>,
}

impl Config {
    pub fn from_flags(flags: &Flags) -> Self {
        let emit_prompt = !flags.is_set("no-prompt");
        let prompt = env::var(PROMPT_VAR).unwrap_or_else(|_| DEFAULT_PROMPT.to_string());

        // History only makes sense for an interactive session.
        let history_path = if emit_prompt {
            dirs::home_dir().map(|home| home.join(HISTORY_FILE))
        } else {
            None
        };

        Config {
            prompt,
            emit_prompt,
            verbose: flags.is_set("verbose"),
            history_path,
        }
    }

    pub fn prompt(&self) -> &str {
        if self.emit_prompt {
            &self.prompt
        } else {
            ""
        }
    }

    pub fn emit_prompt(&self) -> bool {
        self.emit_prompt
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn history_path(&self) -> Option<&Path> {
        self.history_path.as_deref()
    }
}
