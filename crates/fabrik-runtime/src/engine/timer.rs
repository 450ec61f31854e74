//! Periodic cycle timer.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::RuntimeError;

#[derive(Debug)]
struct TimerState {
    next_expiry: Instant,
    stopped: bool,
}

/// Periodic tick source for the dispatcher.
///
/// Fires `on_tick` once per period from a dedicated thread. `restart`
/// re-phases the next expiry relative to now; the timer stops when dropped.
pub(crate) struct CycleTimer {
    period: Duration,
    state: Arc<(Mutex<TimerState>, Condvar)>,
    join: Option<thread::JoinHandle<()>>,
}

impl CycleTimer {
    /// Arm the timer with the given period.
    pub fn start<F>(period: Duration, on_tick: F) -> Result<Self, RuntimeError>
    where
        F: Fn() + Send + 'static,
    {
        let state = Arc::new((
            Mutex::new(TimerState {
                next_expiry: Instant::now() + period,
                stopped: false,
            }),
            Condvar::new(),
        ));
        let thread_state = state.clone();
        let join = thread::Builder::new()
            .name("fabrik-cycle-timer".into())
            .spawn(move || run_timer(&thread_state, period, &on_tick))
            .map_err(|err| RuntimeError::ThreadSpawn(err.to_string().into()))?;
        Ok(Self {
            period,
            state,
            join: Some(join),
        })
    }

    /// Re-phase the timer: the next expiry is one full period from now.
    pub fn restart(&self) {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().expect("cycle timer poisoned");
        state.next_expiry = Instant::now() + self.period;
        cvar.notify_one();
    }

    /// Stop the timer thread and wait for it to exit.
    pub fn stop(&mut self) {
        {
            let (lock, cvar) = &*self.state;
            let mut state = lock.lock().expect("cycle timer poisoned");
            state.stopped = true;
            cvar.notify_one();
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for CycleTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_timer<F: Fn()>(state: &(Mutex<TimerState>, Condvar), period: Duration, on_tick: &F) {
    let (lock, cvar) = state;
    let mut guard = lock.lock().expect("cycle timer poisoned");
    loop {
        if guard.stopped {
            return;
        }
        let now = Instant::now();
        if now >= guard.next_expiry {
            guard.next_expiry += period;
            if guard.next_expiry <= now {
                // fell behind by more than a period, resynchronize
                guard.next_expiry = now + period;
            }
            on_tick();
            continue;
        }
        let wait = guard.next_expiry - now;
        let (next, _) = cvar
            .wait_timeout(guard, wait)
            .expect("cycle timer poisoned");
        guard = next;
    }
}
