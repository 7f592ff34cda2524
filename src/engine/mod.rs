mod step;
mod task;

pub use step::{FixedStep, RandomStep, StepSource};
pub use task::TaskError;

use crate::model::{RunnerConfig, TaskSnapshot};
use step::sanitize_step;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use task::TickOutcome;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Opaque reference to one run started by a [`SimulatedTaskRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    generation: u64,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.generation
    }
}

/// Drives a mock long-running task with timer ticks of random size.
///
/// State is published through a `watch` channel and every mutation goes
/// through it, so ticks, cancels and failures are serialised. Must be used
/// inside a Tokio runtime.
pub struct SimulatedTaskRunner {
    state: Arc<watch::Sender<TaskSnapshot>>,
    steps: Arc<Mutex<Box<dyn StepSource>>>,
    next_generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Default for SimulatedTaskRunner {
    fn default() -> Self {
        Self::new(Box::new(RandomStep::from_entropy()))
    }
}

impl SimulatedTaskRunner {
    pub fn new(steps: Box<dyn StepSource>) -> Self {
        let (tx, _) = watch::channel(TaskSnapshot::default());
        Self {
            state: Arc::new(tx),
            steps: Arc::new(Mutex::new(steps)),
            next_generation: 0,
            timer: None,
        }
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TaskSnapshot> {
        self.state.subscribe()
    }

    /// Start a new run, replacing any run in progress.
    ///
    /// Status is `Running` with progress 0 when this returns; the first tick
    /// fires one `tick_interval` later.
    pub fn start(&mut self, config: &RunnerConfig) -> TaskHandle {
        if let Some(prev) = self.timer.take() {
            prev.abort();
            log::debug!("replacing run {}", self.next_generation);
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        self.state.send_modify(|s| s.begin(generation));

        let period = config.tick_interval.max(Duration::from_millis(1));
        let max_step = config.max_step_percent;
        let deadline = config.max_duration.map(|d| Instant::now() + d);
        let state = self.state.clone();
        let steps = self.steps.clone();

        log::debug!(
            "run {generation} started (interval {:?}, max step {max_step})",
            period
        );
        self.timer = Some(tokio::spawn(tick_loop(
            state, steps, generation, period, max_step, deadline,
        )));
        TaskHandle { generation }
    }

    /// Stop the timer of `handle`'s run, freezing status and progress.
    ///
    /// Returns `false` when the run was already stopped or superseded.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let halted = self.state.send_if_modified(|s| s.halt(handle.generation));
        if halted {
            self.abort_timer();
            log::debug!("run {} cancelled", handle.generation);
        }
        halted
    }

    /// Mark `handle`'s run as failed, freezing its progress.
    pub fn fail(&mut self, handle: TaskHandle, reason: &str) -> Result<(), TaskError> {
        let mut result = Ok(());
        self.state.send_if_modified(|s| {
            result = s.fail(handle.generation, reason);
            result.is_ok()
        });
        if result.is_ok() {
            self.abort_timer();
            log::debug!("run {} failed: {reason}", handle.generation);
        }
        result
    }

    fn abort_timer(&mut self) {
        if let Some(h) = self.timer.take() {
            h.abort();
        }
    }
}

impl Drop for SimulatedTaskRunner {
    fn drop(&mut self) {
        self.abort_timer();
    }
}

async fn tick_loop(
    state: Arc<watch::Sender<TaskSnapshot>>,
    steps: Arc<Mutex<Box<dyn StepSource>>>,
    generation: u64,
    period: Duration,
    max_step: f64,
    deadline: Option<Instant>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let timeout = async move {
        match deadline {
            Some(d) => tokio::time::sleep_until(d).await,
            None => futures::future::pending::<()>().await,
        }
    };
    tokio::pin!(timeout);

    loop {
        tokio::select! {
            _ = &mut timeout => {
                let failed = state.send_if_modified(|s| s.fail(generation, "timed out").is_ok());
                if failed {
                    log::warn!("run {generation} timed out");
                }
                break;
            }
            _ = ticker.tick() => {
                let delta = {
                    let mut steps = steps.lock().unwrap_or_else(|e| e.into_inner());
                    sanitize_step(steps.next_step(max_step), max_step)
                };
                let mut outcome = TickOutcome::Ignored;
                state.send_if_modified(|s| {
                    outcome = s.apply_tick(generation, delta);
                    outcome != TickOutcome::Ignored
                });
                match outcome {
                    TickOutcome::Advanced => {}
                    TickOutcome::Completed => {
                        log::info!("run {generation} completed");
                        break;
                    }
                    TickOutcome::Ignored => break,
                }
            }
        }
    }
}
