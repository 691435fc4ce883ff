use std::env;
use std::io;
use std::process;

use tsh::config::Config;
use tsh::error::ShellError;
use tsh::flags::Flags;
use tsh::highlight::Highlighter;
use tsh::logging;
use tsh::shell::Shell;

fn main() -> Result<(), ShellError> {
    // A test driver reading our stdout sees error output too.
    redirect_stderr()?;

    let mut flags = Flags::new();
    let args: Vec<String> = env::args().skip(1).collect();
    let highlighter = Highlighter::detect();

    if let Err(e) = flags.parse(&args) {
        println!("{}", highlighter.error(&e.to_string()));
        flags.print_help(&highlighter);
        process::exit(1);
    }

    if flags.is_set("help") {
        flags.print_help(&highlighter);
        process::exit(1);
    }

    if flags.is_set("version") {
        println!("tsh {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::from_flags(&flags);
    logging::init(config.verbose());

    let mut shell = Shell::new(config)?;
    shell.run()
}

fn redirect_stderr() -> Result<(), ShellError> {
    // SAFETY: both descriptors are owned by the process for its lifetime.
    if unsafe { libc::dup2(libc::STDOUT_FILENO, libc::STDERR_FILENO) } < 0 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(())
}
