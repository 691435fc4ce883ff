use std::io::Write;

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Routes `log` records to stdout.
///
/// Verbose mode turns on the `debug` trace lines; otherwise only warnings
/// and errors come through. `RUST_LOG` still wins when it is set. Records
/// carry no timestamp or level so traces read like ordinary shell output.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let _ = Builder::new()
        .filter_level(level)
        .parse_env(Env::default())
        .target(Target::Stdout)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .try_init();
}
