use std::future::Future;
use std::time::Duration;

use super::types::GeoError;
use tracing::warn;

/// Bounded attempt policy with a fixed pause between attempts.
#[derive(Debug, Clone)]
pub struct AttemptPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(2000),
        }
    }
}

/// Execute an async operation up to `policy.max_attempts` times.
///
/// Non-retryable errors (see [`GeoError::classify`]) are returned at once.
/// When every attempt fails the last error is returned.
pub async fn with_attempts<F, Fut, T>(
    operation_name: &str,
    policy: &AttemptPolicy,
    mut factory: F,
) -> Result<T, GeoError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, GeoError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match factory(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let classification = e.classify();

                if !classification.retryable {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error_type = classification.error_type,
                        "Non-retryable error, failing immediately"
                    );
                    return Err(e);
                }

                warn!(
                    operation = operation_name,
                    attempt,
                    max = max_attempts,
                    error_type = classification.error_type,
                    error = %e,
                    "Attempt failed"
                );

                if attempt < max_attempts && !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| GeoError::Internal("attempt loop exited unexpectedly".into())))
}
