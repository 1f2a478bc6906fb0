//! Retry an async attempt on a fixed interval until it succeeds or a
//! deadline passes.
//!
//! The first attempt starts one interval after the call. Attempts never
//! overlap: the next tick is awaited only after the previous attempt has
//! finished, and ticks missed while an attempt was running are not replayed
//! in a burst. When the deadline fires, the in-flight attempt and the ticker
//! are dropped together, so nothing runs after the returned future settles.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::config::{PollOptions, PollSettings};
use crate::errors::{Error, Result};

/// Run `attempt` every `interval` until it returns `Ok`, or fail with
/// [`Error::PollTimeout`] carrying the last attempt's error once `timeout`
/// has elapsed.
pub async fn poll_with<F, Fut, T>(mut attempt: F, timeout: Duration, interval: Duration) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let deadline = time::sleep_until(later(start, timeout));
    tokio::pin!(deadline);

    // interval_at panics on a zero period
    let period = interval.clamp(Duration::from_nanos(1), FAR_FUTURE);
    let mut ticker = time::interval_at(later(start, period), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_error: Option<Error> = None;
    let mut attempts = 0u32;
    loop {
        tokio::select! {
            biased;
            () = &mut deadline => {
                debug!(attempts, ?timeout, "poll timed out");
                return Err(Error::PollTimeout {
                    timeout,
                    last_error: last_error.map(Box::new),
                });
            }
            outcome = tick_then(&mut ticker, &mut attempt) => {
                attempts += 1;
                match outcome {
                    Ok(value) => {
                        debug!(attempts, elapsed = ?start.elapsed(), "poll settled");
                        return Ok(value);
                    }
                    Err(err) => {
                        trace!(attempts, error = %err, "poll attempt failed");
                        last_error = Some(err);
                    }
                }
            }
        }
    }
}

/// Stand-in for "never", the same horizon tokio uses for `sleep(Duration::MAX)`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn later(start: Instant, by: Duration) -> Instant {
    start.checked_add(by).unwrap_or_else(|| start + FAR_FUTURE)
}

async fn tick_then<F, Fut, T>(ticker: &mut Interval, attempt: &mut F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    ticker.tick().await;
    attempt().await
}

/// [`poll_with`] using `options` over phrase-polling defaults.
pub async fn poll<F, Fut, T>(attempt: F, options: PollOptions) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let (timeout, interval) = options.resolve(PollSettings::phrase());
    poll_with(attempt, timeout, interval).await
}

/// Produce a fresh value each attempt and pass it to `verify`.
pub async fn poll_verify<P, Fut, T, V>(producer: P, verify: V, options: PollOptions) -> Result<()>
where
    P: Fn() -> Fut,
    Fut: Future<Output = T>,
    V: Fn(T) -> Result<()>,
{
    let producer = &producer;
    let verify = &verify;
    poll(move || async move { verify(producer().await) }, options).await
}
