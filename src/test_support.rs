//! Helpers shared by tests that create real child processes.
//!
//! `waitpid(-1, ..)` collects any child of the test binary, so every test
//! that spawns processes takes [`process_lock`] first.

use std::os::unix::process::CommandExt;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::jobs::{JobControl, Pid};
use crate::process::{reap_children, ReapEvent};

static PROCESS_LOCK: Mutex<()> = Mutex::new(());

const REAP_DEADLINE: Duration = Duration::from_secs(10);

pub(crate) fn process_lock() -> MutexGuard<'static, ()> {
    PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

pub(crate) fn spawn_grouped(argv: &[&str]) -> Pid {
    let child = Command::new(argv[0])
        .args(&argv[1..])
        .process_group(0)
        .spawn()
        .expect("spawn test child");
    child.id() as Pid
}

pub(crate) fn reap_until<P>(control: &JobControl, mut done: P) -> Vec<ReapEvent>
where
    P: FnMut(&ReapEvent) -> bool,
{
    let deadline = Instant::now() + REAP_DEADLINE;
    let mut events = Vec::new();
    while Instant::now() < deadline {
        let mut finished = false;
        reap_children(control, |e| {
            finished |= done(e);
            events.push(e.clone());
        })
        .expect("reap children");
        if finished {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    events
}

/// Drives the reaper on a helper thread, standing in for SIGCHLD delivery.
pub(crate) struct BackgroundReaper {
    stop: Arc<AtomicBool>,
    events: Arc<Mutex<Vec<ReapEvent>>>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundReaper {
    pub(crate) fn start(control: Arc<JobControl>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let events = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let stop = Arc::clone(&stop);
            let events = Arc::clone(&events);
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    let _ = reap_children(&control, |e| {
                        if let Ok(mut seen) = events.lock() {
                            seen.push(e.clone());
                        }
                    });
                    thread::sleep(Duration::from_millis(10));
                }
            })
        };

        BackgroundReaper {
            stop,
            events,
            handle: Some(handle),
        }
    }

    pub(crate) fn events(&self) -> Vec<ReapEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub(crate) fn wait_for<P>(&self, mut done: P) -> bool
    where
        P: FnMut(&ReapEvent) -> bool,
    {
        let deadline = Instant::now() + REAP_DEADLINE;
        while Instant::now() < deadline {
            if self.events().iter().any(&mut done) {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }
}

impl Drop for BackgroundReaper {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
