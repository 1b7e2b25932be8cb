//! Generic send-with-retry over the remote error classes.
//!
//! Policy lives in `RetryPolicy` values; this routine only decides which
//! policy an error falls under. Retryable service statuses and transport
//! failures are counted separately, each against its own bound.

use solace_core::remote::RemoteError;
use solace_core::retry::RetryPolicy;
use std::future::Future;

/// The two retry budgets a remote operation runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicies {
    /// For 502/503/504 responses.
    pub service: RetryPolicy,
    /// For requests that never produced a response.
    pub transport: RetryPolicy,
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            service: RetryPolicy::service_errors(),
            transport: RetryPolicy::transport_errors(),
        }
    }
}

impl RetryPolicies {
    /// Zero-delay variant of the default bounds, for tests.
    pub fn immediate() -> Self {
        Self {
            service: RetryPolicy::new(RetryPolicy::service_errors().max_retries, std::time::Duration::ZERO),
            transport: RetryPolicy::new(
                RetryPolicy::transport_errors().max_retries,
                std::time::Duration::ZERO,
            ),
        }
    }
}

/// Runs `op` until it succeeds or its retry budget is exhausted.
///
/// `op` receives the attempt number (0 for the first try). Non-retryable
/// errors, and retryable ones past their bound, are returned as-is.
pub async fn send_with_retry<T, F, Fut>(
    policies: RetryPolicies,
    mut op: F,
) -> Result<T, RemoteError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let mut attempt = 0u32;
    let mut service_retries = 0u32;
    let mut transport_retries = 0u32;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable_status() && policies.service.allows(service_retries) => {
                service_retries += 1;
                attempt += 1;
                tracing::debug!(
                    target: "retry",
                    "service unavailable ({err}), retry {service_retries}/{} in {:?}",
                    policies.service.max_retries,
                    policies.service.delay
                );
                tokio::time::sleep(policies.service.delay).await;
            }
            Err(err) if err.is_transport() && policies.transport.allows(transport_retries) => {
                transport_retries += 1;
                attempt += 1;
                tracing::debug!(
                    target: "retry",
                    "transport failure ({err}), retry {transport_retries}/{} in {:?}",
                    policies.transport.max_retries,
                    policies.transport.delay
                );
                tokio::time::sleep(policies.transport.delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
