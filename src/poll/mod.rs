//! The poll loop: fetch, render, publish on change, sleep, repeat
//!
//! Runs for the life of the process. Nothing that happens inside a cycle
//! stops the loop; failures are logged and the next cycle waits the idle
//! interval.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time;

use crate::api::{PlaybackSource, StatusSink};
use crate::config::PollSettings;
use crate::status::{should_publish, StatusRenderer};

/// What to do with the tracked status when a publish fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPolicy {
    /// Record the new status as sent anyway. A failed write is only
    /// repaired by the next real change.
    AdvanceAlways,
    /// Keep the previous status so the next cycle publishes again.
    RetainOnFailure,
}

/// Loop state, owned by the loop and reset on every start
#[derive(Debug, Clone, PartialEq)]
pub struct PollState {
    /// Last status handed to the sink; empty after startup
    pub last_rendered_status: String,
    pub current_interval: Duration,
}

pub struct PollLoop<S, P> {
    source: S,
    sink: P,
    renderer: StatusRenderer,
    active_interval: Duration,
    idle_interval: Duration,
    policy: PublishPolicy,
    state: PollState,
}

impl<S: PlaybackSource, P: StatusSink> PollLoop<S, P> {
    pub fn new(source: S, sink: P, renderer: StatusRenderer, settings: &PollSettings) -> Self {
        let policy = if settings.retain_status_on_failed_publish {
            PublishPolicy::RetainOnFailure
        } else {
            PublishPolicy::AdvanceAlways
        };
        Self {
            source,
            sink,
            renderer,
            active_interval: settings.active_interval(),
            idle_interval: settings.idle_interval(),
            policy,
            state: PollState {
                last_rendered_status: String::new(),
                current_interval: settings.idle_interval(),
            },
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Run one cycle and return how long to sleep before the next.
    pub async fn step(&mut self) -> Duration {
        let snapshot = match self.source.fetch_current().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::debug!("No active playback");
                return self.settle(self.idle_interval);
            }
            Err(e) => {
                tracing::warn!("Failed to fetch playback: {:#}", e);
                return self.settle(self.idle_interval);
            }
        };

        let candidate = self.renderer.render(&snapshot);
        if should_publish(&self.state.last_rendered_status, &candidate) {
            match self.sink.publish(&candidate).await {
                Ok(()) => {
                    tracing::info!("Status set to {:?}", candidate);
                    self.state.last_rendered_status = candidate;
                }
                Err(e) if self.policy == PublishPolicy::RetainOnFailure => {
                    tracing::warn!("Failed to publish status, will retry: {:#}", e);
                }
                Err(e) => {
                    tracing::warn!("Failed to publish status: {:#}", e);
                    self.state.last_rendered_status = candidate;
                }
            }
        }

        let interval = if snapshot.is_playing {
            self.active_interval
        } else {
            self.idle_interval
        };
        self.settle(interval)
    }

    fn settle(&mut self, interval: Duration) -> Duration {
        self.state.current_interval = interval;
        interval
    }

    /// Run one cycle, containing any panic inside it. A panicking cycle
    /// is logged, leaves the state untouched and is treated as idle.
    pub async fn cycle(&mut self) -> Duration {
        match AssertUnwindSafe(self.step()).catch_unwind().await {
            Ok(interval) => interval,
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Poll cycle panicked: {}", msg);
                self.settle(self.idle_interval)
            }
        }
    }

    /// Poll until Ctrl+C.
    pub async fn run(mut self) {
        tracing::info!(
            "Polling (active: {:?}, idle: {:?}, policy: {:?})",
            self.active_interval,
            self.idle_interval,
            self.policy
        );

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            let interval = self.cycle().await;

            tokio::select! {
                _ = time::sleep(interval) => {}
                _ = &mut shutdown => {
                    tracing::info!("Shutting down...");
                    return;
                }
            }
        }
    }
}
