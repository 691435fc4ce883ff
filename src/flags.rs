use crate::error::ShellError;
use crate::highlight::Highlighter;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Flags {
    flags: BTreeMap<String, Flag>,
}

#[derive(Debug, Clone)]
pub struct Flag {
    pub short: String,
    pub long: String,
    pub description: String,
    pub value: Option<String>,
}

impl Default for Flags {
    fn default() -> Self {
        Self::new()
    }
}

impl Flags {
    pub fn new() -> Self {
        let mut flags = BTreeMap::new();

        flags.insert(
            "help".to_string(),
            Flag {
                short: "-h".to_string(),
                long: "--help".to_string(),
                description: "Print this message".to_string(),
                value: None,
            },
        );

        flags.insert(
            "verbose".to_string(),
            Flag {
                short: "-v".to_string(),
                long: "--verbose".to_string(),
                description: "Print additional diagnostic information".to_string(),
                value: None,
            },
        );

        flags.insert(
            "no-prompt".to_string(),
            Flag {
                short: "-p".to_string(),
                long: "--no-prompt".to_string(),
                description: "Do not emit a command prompt".to_string(),
                value: None,
            },
        );

        flags.insert(
            "version".to_string(),
            Flag {
                short: "-V".to_string(),
                long: "--version".to_string(),
                description: "Show version information".to_string(),
                value: None,
            },
        );

        Flags { flags }
    }

    /// Parses startup arguments. Short flags may be combined, as in `-vp`.
    pub fn parse(&mut self, args: &[String]) -> Result<(), ShellError> {
        for arg in args {
            if arg.starts_with("--") {
                self.set(arg)?;
                continue;
            }

            let letters = arg
                .strip_prefix('-')
                .filter(|rest| !rest.is_empty())
                .ok_or_else(|| ShellError::FlagError(format!("unexpected argument {}", arg)))?;
            for letter in letters.chars() {
                self.set(&format!("-{}", letter))?;
            }
        }
        Ok(())
    }

    fn set(&mut self, arg: &str) -> Result<(), ShellError> {
        let flag = self
            .flags
            .values_mut()
            .find(|flag| arg == flag.short || arg == flag.long)
            .ok_or_else(|| ShellError::FlagError(format!("unknown option {}", arg)))?;
        flag.value = Some("true".to_string());
        Ok(())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.flags
            .get(name)
            .and_then(|f| f.value.as_ref())
            .is_some()
    }

    pub fn print_help(&self, highlighter: &Highlighter) {
        println!("{} tsh [-hvpV]", highlighter.heading("Usage:"));
        for flag in self.flags.values() {
            println!(
                "   {}, {:<13} {}",
                highlighter.flag(&flag.short),
                flag.long,
                flag.description
            );
        }
    }
}
