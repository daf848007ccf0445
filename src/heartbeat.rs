use log::debug;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use thread_priority::{set_current_thread_priority, ThreadPriority};

/// Cancellation flag the heartbeat thread sleeps on.
struct Signal {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

impl Signal {
    fn is_cancelled(&self) -> bool {
        *self.cancelled.lock().unwrap()
    }

    /// Sleep for `interval` or until cancelled. Returns true when cancelled.
    fn wait(&self, interval: Duration) -> bool {
        let guard = self.cancelled.lock().unwrap();
        let (guard, _) = self
            .cond
            .wait_timeout_while(guard, interval, |cancelled| !*cancelled)
            .unwrap();
        *guard
    }

    fn cancel(&self) {
        *self.cancelled.lock().unwrap() = true;
        self.cond.notify_all();
    }
}

/// Handle to a running periodic task.
///
/// The thread is detached: dropping or cancelling the handle never joins it,
/// so a heartbeat never holds up process exit.
pub(crate) struct HeartbeatTask {
    signal: Arc<Signal>,
    thread: JoinHandle<()>,
}

impl HeartbeatTask {
    /// Spawn a low-priority thread calling `tick` immediately and then once
    /// per `interval` until cancelled.
    pub(crate) fn spawn<F>(interval: Duration, tick: F) -> std::io::Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let signal = Arc::new(Signal {
            cancelled: Mutex::new(false),
            cond: Condvar::new(),
        });

        let s = Arc::clone(&signal);
        let thread = std::thread::Builder::new()
            .name("swetrix-heartbeat".to_string())
            .spawn(move || {
                lower_priority();
                loop {
                    if s.is_cancelled() {
                        break;
                    }
                    tick();
                    if s.wait(interval) {
                        break;
                    }
                }
            })?;

        Ok(Self { signal, thread })
    }

    /// Wake the thread and make it exit. An in-flight tick is not
    /// interrupted; the loop ends once it returns.
    pub(crate) fn cancel(self) {
        self.signal.cancel();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

/// Drop the calling thread to the lowest scheduling priority. Returns false
/// when the platform refuses; the heartbeat then keeps the default.
fn lower_priority() -> bool {
    match set_current_thread_priority(ThreadPriority::Min) {
        Ok(()) => true,
        Err(e) => {
            debug!("[swetrix] Could not lower heartbeat thread priority: {e:?}");
            false
        }
    }
}
