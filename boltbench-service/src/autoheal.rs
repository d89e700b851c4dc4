//! Measures how long the proxy takes to serve an object again.
//!
//! After an object was damaged in the proxy's cache, the proxy is expected to heal it from the
//! baseline store. The check keeps reading the object until a read succeeds.

use std::time::Duration;

use serde::{Serialize, Serializer};
use tokio::time::Instant;

use crate::backend::Backend;

/// The outcome of an auto-heal check.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AutoHeal {
    /// Time from the first attempt until the first successful read.
    #[serde(rename = "auto_heal_time", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Number of read attempts, including the successful one.
    #[serde(skip)]
    pub attempts: u64,
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{} ms", elapsed.as_millis()))
}

/// Reads `key` from `proxy` until a read succeeds, pausing `retry_interval` between attempts.
///
/// There is no upper bound on the number of attempts.
#[tracing::instrument(level = "debug", skip(proxy))]
pub async fn auto_heal(
    proxy: &dyn Backend,
    bucket: &str,
    key: &str,
    retry_interval: Duration,
) -> AutoHeal {
    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        match proxy.get_object(bucket, key).await {
            Ok(_response) => break,
            Err(error) => {
                tracing::debug!(
                    attempts,
                    error = &error as &dyn std::error::Error,
                    "object not healed yet"
                );
            }
        }

        if !retry_interval.is_zero() {
            tokio::time::sleep(retry_interval).await;
        }
    }

    let elapsed = start.elapsed();
    tracing::info!(attempts, ?elapsed, "object healed");

    AutoHeal { elapsed, attempts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;

    #[tokio::test(start_paused = true)]
    async fn retries_until_read_succeeds() {
        let proxy = InMemoryBackend::new("bolt").with_latency(Duration::from_millis(10));
        proxy.insert("bucket", "key", "x");
        proxy.fail_on_key_times("key", 3);

        let heal = auto_heal(&proxy, "bucket", "key", Duration::from_millis(5)).await;

        assert_eq!(heal.attempts, 4);
        assert_eq!(heal.elapsed, Duration::from_millis(4 * 10 + 3 * 5));
        assert_eq!(
            serde_json::to_value(heal).unwrap(),
            serde_json::json!({ "auto_heal_time": "55 ms" })
        );
    }

    #[tokio::test]
    async fn healthy_object_succeeds_immediately() {
        let proxy = InMemoryBackend::new("bolt");
        proxy.insert("bucket", "key", "x");

        let heal = auto_heal(&proxy, "bucket", "key", Duration::ZERO).await;
        assert_eq!(heal.attempts, 1);
    }
}
