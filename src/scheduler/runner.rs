//! Periodic driver for the scans.

use super::{ScanError, ScanKind, ScanReport, Scans};
use crate::notification::ports::Notifier;
use crate::stats::ports::StatsStore;
use crate::task::domain::resolve_local;
use crate::task::ports::TaskStore;
use chrono::{DateTime, NaiveTime, TimeZone, Timelike, Utc};
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Background loops running the three scans on their intervals.
///
/// Reminder and overdue loops tick immediately and then every period. The
/// digest loop's first tick is aligned to the start of the next digest hour
/// (or fires at once when started inside it). Ticks missed while a pass is
/// still running are skipped rather than bunched.
#[derive(Debug)]
pub struct SchedulerRunner {
    handles: Vec<JoinHandle<()>>,
}

impl SchedulerRunner {
    /// Spawns the three loops onto the current tokio runtime.
    #[must_use]
    pub fn start<S, T, N, C>(scans: Arc<Scans<S, T, N>>, clock: Arc<C>) -> Self
    where
        S: TaskStore + 'static,
        T: StatsStore + 'static,
        N: Notifier + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let settings = *scans.settings();
        let now = Instant::now();
        let digest_delay =
            until_digest_hour(clock.utc(), settings.digest_hour, &settings.timezone);

        let reminder_scans = Arc::clone(&scans);
        let overdue_scans = Arc::clone(&scans);
        let digest_scans = scans;

        let handles = vec![
            spawn_loop(
                ScanKind::Reminder,
                now,
                settings.intervals.reminder,
                Arc::clone(&clock),
                move |at| {
                    let scans = Arc::clone(&reminder_scans);
                    async move { scans.run_reminder_scan(at).await }
                },
            ),
            spawn_loop(
                ScanKind::Overdue,
                now,
                settings.intervals.overdue,
                Arc::clone(&clock),
                move |at| {
                    let scans = Arc::clone(&overdue_scans);
                    async move { scans.run_overdue_scan(at).await }
                },
            ),
            spawn_loop(
                ScanKind::Digest,
                now + digest_delay,
                settings.intervals.digest,
                clock,
                move |at| {
                    let scans = Arc::clone(&digest_scans);
                    async move { scans.run_digest(at).await }
                },
            ),
        ];
        info!(
            digest_in_secs = digest_delay.as_secs(),
            "scheduler started"
        );
        Self { handles }
    }

    /// Stops every loop and waits for them to wind down.
    ///
    /// A pass in flight is abandoned at its next suspension point; work
    /// already committed stays committed.
    pub async fn shutdown(self) {
        for handle in &self.handles {
            handle.abort();
        }
        for handle in self.handles {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    error!(error = %err, "scheduler loop panicked");
                }
            }
        }
        info!("scheduler stopped");
    }
}

fn spawn_loop<C, F, Fut>(
    scan: ScanKind,
    start: Instant,
    period: Duration,
    clock: Arc<C>,
    run: F,
) -> JoinHandle<()>
where
    C: Clock + Send + Sync + 'static,
    F: Fn(DateTime<Utc>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<ScanReport, ScanError>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match run(clock.utc()).await {
                Ok(report) => debug!(scan = scan.as_str(), ?report, "tick complete"),
                Err(err) => error!(scan = scan.as_str(), error = %err, "scan failed; retrying next tick"),
            }
        }
    })
}

/// Returns how long to wait until the next start of `hour` in `zone`
/// local time, or zero when `now` already falls inside that hour.
///
/// The target is resolved on its own date, so the wait across a
/// daylight-saving change is an hour shorter or longer than the wall-clock
/// difference suggests.
pub(super) fn until_digest_hour<Z: TimeZone>(
    now: DateTime<Utc>,
    hour: u32,
    zone: &Z,
) -> Duration {
    let local = now.with_timezone(zone);
    if local.hour() == hour {
        return Duration::ZERO;
    }
    let Some(at_hour) = NaiveTime::from_hms_opt(hour, 0, 0) else {
        return Duration::ZERO;
    };
    let date = local.date_naive();
    let today_target = resolve_local(zone, date.and_time(at_hour));
    let target = if today_target > now {
        today_target
    } else {
        date.succ_opt()
            .map_or(today_target, |next| resolve_local(zone, next.and_time(at_hour)))
    };
    (target - now).to_std().unwrap_or(Duration::ZERO)
}
