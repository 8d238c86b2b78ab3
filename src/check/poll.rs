//! Fixed-interval bounded polling.
//!
//! The harness never watches; everything waits by re-querying at a fixed
//! interval until an overall window elapses. There is no backoff and no
//! cancellation beyond the window.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::error::{Error, Result};

/// Run `probe` every `interval` until it yields a value or `window`
/// elapses.
///
/// The probe runs once immediately. A probe returning `None` means "not
/// yet"; probes are expected to swallow transient errors themselves. On
/// expiry the returned error names the awaited condition.
pub async fn poll<F, Fut, T>(
    interval: Duration,
    window: Duration,
    what: impl Into<String>,
    mut probe: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let what = what.into();
    let deadline = Instant::now() + window;
    loop {
        if let Some(value) = probe().await {
            return Ok(value);
        }
        if Instant::now() + interval > deadline {
            return Err(Error::Timeout {
                what,
                window,
                last: None,
            });
        }
        sleep(interval).await;
    }
}
