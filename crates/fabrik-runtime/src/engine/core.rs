//! Event-chain dispatcher thread and lifecycle control.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::fb::EventEntry;

use super::metrics::{EngineCounters, EngineMetrics};
use super::queue::EventQueue;
use super::sync::SuspendSemaphore;
use super::timer::CycleTimer;

/// Management commands applied to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MgmCommand {
    /// Drain the init queue, then launch the dispatcher thread.
    Start,
    /// Exit the dispatcher, leaving pending events in place.
    Stop,
    /// Discard pending events, then exit the dispatcher.
    Kill,
    /// Reserved; currently a no-op.
    Reset,
}

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Constructed, never started.
    #[default]
    Created,
    /// Start in progress: init queue draining on the caller thread.
    InitDraining,
    /// Dispatcher processing events.
    Running,
    /// Dispatcher idle, waiting for the next cycle tick or enqueue.
    Suspended,
    /// Dispatcher exited.
    Terminated,
}

#[derive(Debug)]
struct Queues {
    init: EventQueue,
    run: EventQueue,
}

#[derive(Debug)]
struct EngineShared {
    alive: AtomicBool,
    exe_done: AtomicBool,
    processing_events: AtomicBool,
    init_drained: AtomicBool,
    state: Mutex<EngineState>,
    queues: Mutex<Queues>,
    suspend: SuspendSemaphore,
    counters: EngineCounters,
}

impl EngineShared {
    fn with_queue_capacity(capacity: usize) -> Self {
        Self {
            alive: AtomicBool::new(false),
            exe_done: AtomicBool::new(false),
            processing_events: AtomicBool::new(false),
            init_drained: AtomicBool::new(false),
            state: Mutex::new(EngineState::Created),
            queues: Mutex::new(Queues {
                init: EventQueue::with_capacity(capacity),
                run: EventQueue::with_capacity(capacity),
            }),
            suspend: SuspendSemaphore::new(),
            counters: EngineCounters::default(),
        }
    }

    fn set_state(&self, state: EngineState) {
        *self.state.lock().expect("engine state poisoned") = state;
    }

    fn state(&self) -> EngineState {
        *self.state.lock().expect("engine state poisoned")
    }

    fn enqueue_run(&self, entry: EventEntry) {
        let accepted = {
            let mut queues = self.queues.lock().expect("event queues poisoned");
            queues.run.try_enqueue(entry)
        };
        if accepted {
            // wake a suspended dispatcher; a pending tick absorbs this
            self.suspend.post();
        } else {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn enqueue_init(&self, entry: EventEntry) {
        let accepted = {
            let mut queues = self.queues.lock().expect("event queues poisoned");
            queues.init.try_enqueue(entry)
        };
        if !accepted {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn timer_tick(&self) {
        if !self.suspend.post() {
            self.counters.collapsed_ticks.fetch_add(1, Ordering::Relaxed);
            warn!("cycle tick collapsed, dispatcher still busy");
        }
    }
}

/// Cloneable engine access passed to function blocks and communication
/// layers.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    shared: Arc<EngineShared>,
}

impl EngineHandle {
    /// Enqueue an event on the run queue.
    pub fn add_event_entry(&self, entry: EventEntry) {
        self.shared.enqueue_run(entry);
    }

    /// Enqueue an event on the init queue, drained once on Start.
    pub fn add_init_event_entry(&self, entry: EventEntry) {
        self.shared.enqueue_init(entry);
    }

    /// Start a new event chain from an external stimulus.
    pub fn start_event_chain(&self, entry: EventEntry) {
        self.shared
            .processing_events
            .store(true, Ordering::SeqCst);
        self.shared.enqueue_run(entry);
    }

    /// Whether an externally triggered chain is still in flight.
    #[must_use]
    pub fn is_processing_events(&self) -> bool {
        self.shared.processing_events.load(Ordering::SeqCst)
    }

    /// Whether the dispatcher has drained the run queue and suspended.
    #[must_use]
    pub fn exe_done(&self) -> bool {
        self.shared.exe_done.load(Ordering::SeqCst)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.shared.state()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn metrics(&self) -> EngineMetrics {
        self.shared.counters.snapshot()
    }

    /// Pending entries on the run queue.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.shared.queues.lock().expect("event queues poisoned").run.len()
    }

    /// Pending entries on the init queue.
    #[must_use]
    pub fn pending_init_events(&self) -> usize {
        self.shared.queues.lock().expect("event queues poisoned").init.len()
    }
}

/// Single-threaded cooperative dispatcher propagating events through a
/// function-block graph under a periodic cycle timer.
///
/// One dedicated dispatcher thread per engine instance; function blocks run
/// synchronously on that thread. The engine suspends itself whenever the
/// run queue is drained and wakes on the next cycle tick or enqueue.
#[derive(Debug)]
pub struct EventChainEngine {
    shared: Arc<EngineShared>,
    cycle_time_ms: AtomicU16,
    deadline: Mutex<Option<Duration>>,
    join: Option<thread::JoinHandle<()>>,
}

impl EventChainEngine {
    /// Engine with the default queue capacity.
    #[must_use]
    pub fn new(config: &RuntimeConfig) -> Self {
        Self::with_queue_capacity(config, super::queue::EVENT_QUEUE_CAPACITY)
    }

    /// Engine with an explicit queue capacity for both queues.
    #[must_use]
    pub fn with_queue_capacity(config: &RuntimeConfig, capacity: usize) -> Self {
        Self {
            shared: Arc::new(EngineShared::with_queue_capacity(capacity)),
            cycle_time_ms: AtomicU16::new(config.cycle_time_ms),
            deadline: Mutex::new(config.deadline()),
            join: None,
        }
    }

    /// Handle for function blocks and communication layers.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            shared: self.shared.clone(),
        }
    }

    /// Set the cycle period. Takes effect on the next Start.
    pub fn set_cycle_time(&self, time_ms: u16) {
        self.cycle_time_ms.store(time_ms, Ordering::SeqCst);
    }

    /// Set the cycle deadline. Takes effect on the next Start.
    pub fn set_deadline(&self, deadline: Duration) {
        *self.deadline.lock().expect("deadline poisoned") = Some(deadline);
    }

    /// Apply a management command.
    pub fn change_execution_state(&mut self, command: MgmCommand) -> Result<(), RuntimeError> {
        match command {
            MgmCommand::Start => self.start(),
            MgmCommand::Stop => {
                self.halt();
                Ok(())
            }
            MgmCommand::Kill => {
                {
                    let mut queues = self.shared.queues.lock().expect("event queues poisoned");
                    queues.init.clear();
                    queues.run.clear();
                }
                self.halt();
                Ok(())
            }
            MgmCommand::Reset => Ok(()),
        }
    }

    /// Drain the init queue, then launch the dispatcher thread.
    ///
    /// A no-op while the dispatcher is already alive.
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        if self.shared.alive.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.shared.set_state(EngineState::InitDraining);
        let handle = self.handle();
        loop {
            let entry = {
                let mut queues = self.shared.queues.lock().expect("event queues poisoned");
                queues.init.try_dequeue()
            };
            let Some(entry) = entry else { break };
            dispatch_entry(&entry, &handle, &self.shared.counters);
        }
        self.shared.init_drained.store(true, Ordering::SeqCst);
        self.shared.alive.store(true, Ordering::SeqCst);

        let shared = self.shared.clone();
        let cycle_time = Duration::from_millis(u64::from(self.cycle_time_ms.load(Ordering::SeqCst)));
        let deadline = *self.deadline.lock().expect("deadline poisoned");
        let spawned = thread::Builder::new()
            .name("fabrik-event-chain".into())
            .spawn(move || run_dispatch_loop(&shared, cycle_time, deadline));
        match spawned {
            Ok(join) => {
                self.join = Some(join);
                self.shared.set_state(EngineState::Running);
                Ok(())
            }
            Err(err) => {
                self.shared.alive.store(false, Ordering::SeqCst);
                self.shared.set_state(EngineState::Terminated);
                Err(RuntimeError::ThreadSpawn(err.to_string().into()))
            }
        }
    }

    /// Exit the dispatcher, leaving pending events in place.
    pub fn stop(&mut self) -> Result<(), RuntimeError> {
        self.change_execution_state(MgmCommand::Stop)
    }

    /// Discard pending events, then exit the dispatcher.
    pub fn kill(&mut self) -> Result<(), RuntimeError> {
        self.change_execution_state(MgmCommand::Kill)
    }

    fn halt(&mut self) {
        self.shared.alive.store(false, Ordering::SeqCst);
        self.shared.suspend.post();
        if self.join.is_none() {
            self.shared.set_state(EngineState::Terminated);
        }
    }

    /// Wait for the dispatcher thread to exit.
    ///
    /// Blocks indefinitely unless Stop or Kill was issued.
    pub fn join(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }

    /// Whether an externally triggered chain is still in flight.
    #[must_use]
    pub fn is_processing_events(&self) -> bool {
        self.shared.processing_events.load(Ordering::SeqCst)
    }

    /// Whether the dispatcher has drained the run queue and suspended.
    #[must_use]
    pub fn exe_done(&self) -> bool {
        self.shared.exe_done.load(Ordering::SeqCst)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.shared.state()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn metrics(&self) -> EngineMetrics {
        self.shared.counters.snapshot()
    }
}

impl Drop for EventChainEngine {
    fn drop(&mut self) {
        self.halt();
        self.join();
    }
}

fn run_dispatch_loop(
    shared: &Arc<EngineShared>,
    cycle_time: Duration,
    deadline: Option<Duration>,
) {
    let handle = EngineHandle {
        shared: shared.clone(),
    };
    shared.exe_done.store(false, Ordering::SeqCst);
    let timer = {
        let shared = shared.clone();
        CycleTimer::start(cycle_time, move || shared.timer_tick())
    };
    let mut timer = match timer {
        Ok(timer) => Some(timer),
        Err(err) => {
            // keep dispatching on enqueue wakes alone
            error!("could not start cycle timer: {err}");
            None
        }
    };

    let mut cycle_start = Instant::now();
    loop {
        if !shared.alive.load(Ordering::SeqCst) {
            break;
        }
        let entry = {
            let mut queues = shared.queues.lock().expect("event queues poisoned");
            queues.run.try_dequeue()
        };
        match entry {
            Some(entry) => dispatch_entry(&entry, &handle, &shared.counters),
            None => {
                shared.processing_events.store(false, Ordering::SeqCst);
                if let Some(deadline) = deadline {
                    let elapsed = cycle_start.elapsed();
                    if elapsed > deadline {
                        shared
                            .counters
                            .deadline_misses
                            .fetch_add(1, Ordering::Relaxed);
                        warn!(?elapsed, ?deadline, "cycle deadline missed");
                    }
                }
                shared.counters.cycles.fetch_add(1, Ordering::Relaxed);
                shared.exe_done.store(true, Ordering::SeqCst);
                shared.set_state(EngineState::Suspended);
                shared.suspend.acquire();
                if !shared.alive.load(Ordering::SeqCst) {
                    break;
                }
                shared.set_state(EngineState::Running);
                shared.exe_done.store(false, Ordering::SeqCst);
                if let Some(timer) = &timer {
                    timer.restart();
                }
                cycle_start = Instant::now();
            }
        }
    }
    if let Some(timer) = &mut timer {
        timer.stop();
    }
    shared.set_state(EngineState::Terminated);
}

fn dispatch_entry(entry: &EventEntry, handle: &EngineHandle, counters: &EngineCounters) {
    let Some(fb) = entry.block() else {
        debug!("skipping event entry for a dropped function block");
        return;
    };
    let port_id = entry.port_id();
    let delivery =
        panic::catch_unwind(AssertUnwindSafe(|| fb.receive_input_event(port_id, handle)));
    if delivery.is_err() {
        error!(
            fb = %fb.instance_name(),
            port_id,
            "function block failed while handling an event"
        );
    }
    counters.dispatched.fetch_add(1, Ordering::Relaxed);
}
