use std::sync::mpsc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::EngineEvent;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Repeating timer that emits [`EngineEvent::PollTick`]; at most one instance runs.
#[derive(Debug)]
pub(crate) struct PollTimer {
    period: Duration,
    running: Option<CancellationToken>,
}

impl PollTimer {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period,
            running: None,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Returns `false` when the timer was already running.
    pub(crate) fn start(&mut self, runtime: &Handle, events: mpsc::Sender<EngineEvent>) -> bool {
        if self.is_running() {
            return false;
        }
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = self.period;
        runtime.spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticks.tick() => {
                        if events.send(EngineEvent::PollTick).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        self.running = Some(token);
        true
    }

    /// Returns `false` when there was nothing to stop.
    pub(crate) fn stop(&mut self) -> bool {
        match self.running.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
