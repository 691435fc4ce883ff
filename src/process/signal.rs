use std::io::{self, Write};
use std::sync::Arc;
use std::thread;

use libc::c_int;
use log::{debug, error};
use signal_hook::consts::signal::{SIGCHLD, SIGQUIT, SIGTSTP};
use signal_hook::iterator::Signals;

use super::{reap_children, signal_group, ProcessError};
use crate::error::ShellError;
use crate::jobs::{JobControl, Pid};

/// Installs the shell's asynchronous handlers.
///
/// The OS-level handlers only queue a notification: `signal-hook` writes to
/// a self-pipe that a dedicated thread drains, and `ctrlc` does the same for
/// SIGINT. All job table work then happens on those threads under the
/// table lock.
pub fn setup_signal_handlers(control: Arc<JobControl>) -> Result<(), ShellError> {
    let mut signals = Signals::new([SIGCHLD, SIGTSTP, SIGQUIT])?;
    let watcher = Arc::clone(&control);
    thread::Builder::new()
        .name("tsh-signals".to_string())
        .spawn(move || {
            let mut stdout = io::stdout();
            for signal in signals.forever() {
                dispatch(&watcher, signal, &mut stdout);
            }
        })?;

    ctrlc::set_handler(move || handle_relay(&control, libc::SIGINT, "sigint_handler"))?;
    Ok(())
}

/// Forwards `signal` to the foreground job's process group.
///
/// Returns the pid it was sent to, or `None` when nothing is in the
/// foreground.
pub fn relay_to_foreground(
    control: &JobControl,
    signal: c_int,
) -> Result<Option<Pid>, ProcessError> {
    let Some(pid) = control.foreground_pid()? else {
        return Ok(None);
    };
    signal_group(pid, signal)?;
    Ok(Some(pid))
}

/// Runs the handler for one signal taken off the self-pipe. Notices go to `out`.
fn dispatch(control: &JobControl, signal: c_int, out: &mut dyn Write) {
    match signal {
        SIGCHLD => handle_sigchld(control, out),
        SIGTSTP => handle_relay(control, libc::SIGTSTP, "sigtstp_handler"),
        SIGQUIT => handle_sigquit(),
        _ => {}
    }
}

fn handle_sigchld(control: &JobControl, out: &mut dyn Write) {
    debug!("sigchld_handler: entering");
    let result = reap_children(control, |event| {
        if event.is_announced() {
            if let Err(e) = writeln!(out, "{}", event).and_then(|_| out.flush()) {
                debug!("sigchld_handler: writing notice: {}", e);
            }
        } else {
            debug!("sigchld_handler: {}", event);
        }
    });
    if let Err(e) = result {
        error!("sigchld_handler: {}", e);
    }
    debug!("sigchld_handler: exiting");
}

fn handle_relay(control: &JobControl, signal: c_int, name: &str) {
    debug!("{}: entering", name);
    match relay_to_foreground(control, signal) {
        Ok(Some(pid)) => debug!("{}: Job ({}) sent signal {}", name, pid, signal),
        Ok(None) => {}
        Err(e) => error!("{}: {}", name, e),
    }
    debug!("{}: exiting", name);
}

fn handle_sigquit() {
    println!("Terminating after receipt of SIGQUIT signal");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobState;
    use crate::process::{ProcessLauncher, ReapEvent};
    use crate::test_support::{process_lock, reap_until, spawn_grouped};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::thread::JoinHandle;
    use std::time::{Duration, Instant};

    /// Output shared between the signal thread and the test.
    #[derive(Clone, Default)]
    struct SharedOutput(Arc<Mutex<Vec<u8>>>);

    impl SharedOutput {
        fn text(&self) -> String {
            self.0
                .lock()
                .map(|buf| String::from_utf8_lossy(&buf).into_owned())
                .unwrap_or_default()
        }

        fn wait_for(&self, needle: &str) -> bool {
            let deadline = Instant::now() + Duration::from_secs(10);
            while Instant::now() < deadline {
                if self.text().contains(needle) {
                    return true;
                }
                thread::sleep(Duration::from_millis(10));
            }
            false
        }
    }

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .map_err(|_| io::Error::other("output poisoned"))?
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Feeds SIGCHLD through `dispatch` until dropped, like the signal thread does.
    struct ChildWatcher {
        stop: Arc<AtomicBool>,
        handle: Option<JoinHandle<()>>,
    }

    impl ChildWatcher {
        fn start(control: Arc<JobControl>, mut out: SharedOutput) -> Self {
            let stop = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&stop);
            let handle = thread::spawn(move || {
                while !flag.load(Ordering::SeqCst) {
                    dispatch(&control, SIGCHLD, &mut out);
                    thread::sleep(Duration::from_millis(5));
                }
            });
            ChildWatcher {
                stop,
                handle: Some(handle),
            }
        }
    }

    impl Drop for ChildWatcher {
        fn drop(&mut self) {
            self.stop.store(true, Ordering::SeqCst);
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn job_state(control: &JobControl, pid: Pid) -> Option<JobState> {
        control
            .lock()
            .ok()
            .and_then(|t| t.find_by_pid(pid).map(|j| j.state))
    }

    fn drive_sigchld_until<P>(control: &JobControl, out: &mut Vec<u8>, mut done: P) -> bool
    where
        P: FnMut(&JobControl) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            dispatch(control, SIGCHLD, out);
            if done(control) {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_sigchld_prints_termination_notice() {
        let _guard = process_lock();
        let control = JobControl::new();
        let pid = spawn_grouped(&["sleep", "5"]);
        control
            .lock()
            .map(|mut t| t.allocate(pid, JobState::Foreground, "sleep 5"))
            .ok();

        assert!(signal_group(pid, libc::SIGINT).is_ok());
        let mut out = Vec::new();
        assert!(drive_sigchld_until(&control, &mut out, |c| {
            c.lock().map(|t| t.is_empty()).unwrap_or(false)
        }));
        assert_eq!(
            String::from_utf8_lossy(&out),
            format!("Job [1] ({}) terminated by signal 2\n", pid)
        );
    }

    #[test]
    fn test_sigchld_is_silent_for_normal_exit() {
        let _guard = process_lock();
        let control = JobControl::new();
        let pid = spawn_grouped(&["true"]);
        control
            .lock()
            .map(|mut t| t.allocate(pid, JobState::Background, "true &"))
            .ok();

        let mut out = Vec::new();
        assert!(drive_sigchld_until(&control, &mut out, |c| {
            c.lock().map(|t| t.is_empty()).unwrap_or(false)
        }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_sigtstp_dispatch_stops_foreground_job() {
        let _guard = process_lock();
        let control = JobControl::new();
        let pid = spawn_grouped(&["sleep", "5"]);
        control
            .lock()
            .map(|mut t| t.allocate(pid, JobState::Foreground, "sleep 5"))
            .ok();

        let mut out = Vec::new();
        dispatch(&control, SIGTSTP, &mut out);
        assert!(out.is_empty());
        assert!(drive_sigchld_until(&control, &mut out, |c| {
            job_state(c, pid) == Some(JobState::Stopped)
        }));
        assert_eq!(
            String::from_utf8_lossy(&out),
            format!("Job [1] ({}) stopped by signal {}\n", pid, libc::SIGTSTP)
        );

        assert!(signal_group(pid, libc::SIGKILL).is_ok());
        reap_until(&control, |e| e.pid() == pid);
    }

    #[test]
    fn test_notice_printed_before_foreground_wait_returns() {
        let _guard = process_lock();
        let control = Arc::new(JobControl::new());
        let output = SharedOutput::default();
        let watcher = ChildWatcher::start(Arc::clone(&control), output.clone());
        let launcher = ProcessLauncher::new(Arc::clone(&control));

        let interrupter = {
            let control = Arc::clone(&control);
            thread::spawn(move || {
                let deadline = Instant::now() + Duration::from_secs(10);
                while Instant::now() < deadline {
                    if let Ok(Some(pid)) = relay_to_foreground(&control, libc::SIGINT) {
                        return Some(pid);
                    }
                    thread::sleep(Duration::from_millis(20));
                }
                None
            })
        };

        let argv = vec!["sleep".to_string(), "5".to_string()];
        let mut out = Vec::new();
        let job = launcher.launch(&argv, false, "sleep 5", &mut out);
        let text = output.text();
        drop(watcher);

        let job = job.expect("launch");
        assert_eq!(interrupter.join().ok().flatten(), Some(job.pid));
        assert_eq!(
            text,
            format!("Job [1] ({}) terminated by signal 2\n", job.pid)
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_background_notice_precedes_reaper_notice() {
        let _guard = process_lock();
        let control = Arc::new(JobControl::new());
        let output = SharedOutput::default();
        let watcher = ChildWatcher::start(Arc::clone(&control), output.clone());
        let launcher = ProcessLauncher::new(Arc::clone(&control));

        let argv: Vec<String> = ["sh", "-c", "kill -9 $$"]
            .iter()
            .map(|w| w.to_string())
            .collect();
        let mut launch_out = output.clone();
        let job = launcher
            .launch(&argv, true, "sh -c 'kill -9 $$' &", &mut launch_out)
            .expect("launch");

        let notice = format!("Job [1] ({}) terminated by signal 9\n", job.pid);
        assert!(output.wait_for(&notice));
        drop(watcher);
        assert_eq!(
            output.text(),
            format!("[1] ({})   sh -c 'kill -9 $$' &\n{}", job.pid, notice)
        );
    }

    #[test]
    fn test_relay_without_foreground_job_is_noop() {
        let control = JobControl::new();
        control
            .lock()
            .map(|mut t| t.allocate(4242, JobState::Background, "bg &"))
            .ok();
        assert!(matches!(
            relay_to_foreground(&control, libc::SIGINT),
            Ok(None)
        ));
    }

    #[test]
    fn test_interrupt_reaches_whole_group() {
        let _guard = process_lock();
        let control = JobControl::new();
        // sh waits on a child of its own; both share the job's group
        let pid = spawn_grouped(&["sh", "-c", "sleep 5; true"]);
        control
            .lock()
            .map(|mut t| t.allocate(pid, JobState::Foreground, "sh -c 'sleep 5; true'"))
            .ok();

        std::thread::sleep(std::time::Duration::from_millis(200));
        assert!(matches!(
            relay_to_foreground(&control, libc::SIGINT),
            Ok(Some(p)) if p == pid
        ));

        let events = reap_until(&control, |e| e.pid() == pid);
        assert!(events.iter().any(|e| matches!(
            e,
            ReapEvent::Signaled { pid: p, signal, .. } if *p == pid && *signal == libc::SIGINT
        )));
        assert!(control.lock().map(|t| t.is_empty()).unwrap_or(false));
    }

    #[test]
    fn test_stop_relay_marks_job_stopped() {
        let _guard = process_lock();
        let control = JobControl::new();
        let pid = spawn_grouped(&["sleep", "5"]);
        control
            .lock()
            .map(|mut t| t.allocate(pid, JobState::Foreground, "sleep 5"))
            .ok();

        assert!(relay_to_foreground(&control, libc::SIGTSTP).is_ok());
        let events = reap_until(&control, |e| e.pid() == pid);
        assert!(events
            .iter()
            .any(|e| e.to_string() == format!("Job [1] ({}) stopped by signal {}", pid, libc::SIGTSTP)));
        assert_eq!(control.foreground_pid(), Ok(None));

        assert!(signal_group(pid, libc::SIGKILL).is_ok());
        reap_until(&control, |e| e.pid() == pid);
    }
}
