//! Timer primitives shared by the controllers: a bounded poll that stops on a
//! terminal condition or a ceiling, a repeating task with start/stop, and
//! one-shot delayed follow-ups.

use std::{future::Future, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Result of a single poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick<T> {
    Continue,
    Done(T),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Finished(T),
    CeilingReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedPoll {
    interval: Duration,
    ceiling: Duration,
}

impl BoundedPoll {
    pub fn new(interval: Duration, ceiling: Duration) -> Self {
        Self { interval, ceiling }
    }

    /// Runs `tick` every `interval`, the first time one interval after the
    /// call, until it returns [`Tick::Done`] or `ceiling` elapses. A tick still
    /// in flight when the ceiling fires is dropped.
    pub async fn run<F, Fut, T>(&self, mut tick: F) -> PollOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Tick<T>>,
    {
        let interval = self.interval;
        let ticks = async move {
            let mut timer = time::interval_at(Instant::now() + interval, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                if let Tick::Done(value) = tick().await {
                    return value;
                }
            }
        };

        match time::timeout(self.ceiling, ticks).await {
            Ok(value) => PollOutcome::Finished(value),
            Err(_) => PollOutcome::CeilingReached,
        }
    }
}

/// A periodic background task. Ticks of one task never overlap; dropping the
/// handle aborts the task.
pub struct RepeatingTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl RepeatingTask {
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut timer = time::interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                if !tick().await {
                    debug!(task = name, "repeating task owner gone; stopping");
                    break;
                }
            }
        });
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn stop(self) {
        debug!(task = self.name, "stopping repeating task");
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Runs `task` once after `delay`.
pub fn schedule_once<Fut>(delay: Duration, task: Fut) -> JoinHandle<()>
where
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        time::sleep(delay).await;
        task.await;
    })
}

#[cfg(test)]
#[path = "tests/polling_tests.rs"]
mod tests;
