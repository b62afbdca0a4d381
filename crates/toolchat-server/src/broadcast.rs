//! Push-channel fan-out and the periodic broadcast task.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use toolchat_core::events::ServerEvent;
use toolchat_tools::ToolExecutor;
use tracing::{debug, info, warn};

use crate::config::PushIntervals;
use crate::transport::{SendOutcome, TransportRegistry};

/// Per-broadcast delivery counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Channels whose queue was full; they stay registered.
    pub dropped: usize,
    /// Channels found closed and deregistered.
    pub removed: usize,
}

/// Sends events to every registered push channel.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<TransportRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<TransportRegistry>) -> Self {
        Self { registry }
    }

    /// Send `event` to all push channels.
    ///
    /// A closed channel is deregistered and logged; the remaining channels
    /// still receive the event.
    pub fn broadcast(&self, event: &ServerEvent) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let channels = self.registry.push_channels();

        for channel in &channels {
            match channel.send(event.clone()) {
                SendOutcome::Delivered => report.delivered += 1,
                SendOutcome::Dropped => report.dropped += 1,
                SendOutcome::Closed => {
                    warn!(
                        client_id = %channel.id(),
                        event = event.name(),
                        "push channel closed, deregistering"
                    );
                    let _ = self.registry.remove(channel.id());
                    report.removed += 1;
                }
            }
        }

        debug!(
            event = event.name(),
            recipients = channels.len(),
            delivered = report.delivered,
            dropped = report.dropped,
            removed = report.removed,
            "broadcast event"
        );
        report
    }

    /// Spawn the periodic push task. It stops when `shutdown` fires.
    pub fn spawn(
        self,
        tools: Arc<ToolExecutor>,
        intervals: PushIntervals,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut time_tick = ticker(intervals.time);
            let mut heartbeat_tick = ticker(intervals.heartbeat);
            let mut system_tick = ticker(intervals.system);
            info!(
                time_secs = intervals.time.as_secs_f64(),
                heartbeat_secs = intervals.heartbeat.as_secs_f64(),
                system_secs = intervals.system.as_secs_f64(),
                "push broadcaster started"
            );

            loop {
                let event = tokio::select! {
                    biased;
                    () = shutdown.cancelled() => break,
                    _ = time_tick.tick() => ServerEvent::time_update(),
                    _ = heartbeat_tick.tick() => ServerEvent::heartbeat(),
                    _ = system_tick.tick() => match tools.sample_system().await {
                        Ok(snapshot) => ServerEvent::SystemUpdate(snapshot.to_value()),
                        Err(e) => {
                            warn!(error = %e, "system sample failed, skipping update");
                            continue;
                        }
                    },
                };
                let _ = self.broadcast(&event);
            }
            info!("push broadcaster stopped");
        })
    }
}

/// Interval whose first tick is one full period away.
fn ticker(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
