use std::future::Future;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use tracing::{error, info};

pub const GAP_BETWEEN_VIDEOS: Duration = Duration::from_secs(5 * 60);

/// Parse a `HH:MM` wall-clock time.
pub fn parse_daily_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| format!("invalid time '{}' (expected HH:MM): {}", s, e))
}

/// Today's slot if it is still ahead of `now`, otherwise tomorrow's.
pub fn next_slot(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now { today } else { today + TimeDelta::days(1) }
}

/// Run `job` `per_day` times at `at` every day, forever. A failed job is
/// logged and the loop carries on.
pub async fn run_daily<F, Fut>(at: NaiveTime, per_day: usize, gap: Duration, mut job: F)
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    info!("Will create {} video(s) at {} daily", per_day, at.format("%H:%M"));
    loop {
        let now = Local::now().naive_local();
        let slot = next_slot(now, at);
        let wait = (slot - now).to_std().unwrap_or_default();
        info!("Next run at {} (in {} minutes)", slot, wait.as_secs() / 60);
        tokio::time::sleep(wait).await;

        run_batch(per_day, gap, &mut job).await;
    }
}

/// One day's worth of runs.
pub async fn run_batch<F, Fut>(per_day: usize, gap: Duration, job: &mut F) -> usize
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut succeeded = 0;
    for i in 0..per_day {
        info!("Creating scheduled video {}/{}", i + 1, per_day);
        match job(i).await {
            Ok(()) => succeeded += 1,
            Err(e) => error!("Scheduled video {} failed: {:#}", i + 1, e),
        }
        if i + 1 < per_day {
            info!("Waiting {} seconds before the next video", gap.as_secs());
            tokio::time::sleep(gap).await;
        }
    }
    succeeded
}
