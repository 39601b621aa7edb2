//! A hand-rolled exponential-backoff loop for connection validation. Small
//! enough that pulling in a dedicated retry crate would be pure overhead.

use std::time::Duration;

/// Retry `attempt` up to `max_attempts` times, sleeping `initial_backoff *
/// 2^n` between tries. Returns the first success, or the last failure.
pub async fn with_backoff<F, Fut, T, E>(max_attempts: u32, initial_backoff: Duration, mut attempt: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut backoff = initial_backoff;
    let mut last_err = None;

    for attempt_number in 0..max_attempts {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_err = Some(err);
                if attempt_number + 1 < max_attempts {
                    tokio::time::delay_for(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    Err(last_err.expect("max_attempts >= 1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), &str> = with_backoff(3, Duration::from_millis(1), || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move { if n < 2 { Err("not yet") } else { Ok(()) } }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let result: Result<(), &str> = with_backoff(2, Duration::from_millis(1), || async { Err("still broken") }).await;
        assert_eq!(result, Err("still broken"));
    }
}
