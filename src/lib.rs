pub mod config;
pub mod error;
pub mod flags;
pub mod highlight;
pub mod logging;
pub mod shell;

pub mod core;
pub mod input;
pub mod jobs;
pub mod process;

#[cfg(test)]
pub(crate) mod test_support;
