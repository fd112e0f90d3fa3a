use crate::errors::AppError;
use failsafe::backoff::{self, Exponential};
use failsafe::failure_policy::{self, ConsecutiveFailures};
use failsafe::{Config, StateMachine};
use std::future::Future;
use std::time::Duration;

/// Circuit breaker guarding the local-proxy tier of a provider client.
pub type ProxyCircuitBreaker = StateMachine<ConsecutiveFailures<Exponential>, ()>;

/// Creates a circuit breaker for the proxy tier so a dead proxy is skipped
/// instead of costing a failed request on every estimate.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures triggers OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// # States
///
/// - **CLOSED**: Normal operation, proxy is tried first.
/// - **OPEN**: Proxy skipped, clients go straight to the provider.
/// - **HALF_OPEN**: Testing if the proxy recovered.
pub fn create_proxy_circuit_breaker() -> ProxyCircuitBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}

/// Runs a proxy call through the breaker. A rejected call (circuit open)
/// surfaces as an `ExternalApiError` so callers fall through to the next tier.
pub async fn call_guarded<T, F>(breaker: &ProxyCircuitBreaker, call: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    use failsafe::futures::CircuitBreaker;

    match breaker.call(call).await {
        Ok(value) => Ok(value),
        Err(failsafe::Error::Inner(e)) => Err(e),
        Err(failsafe::Error::Rejected) => Err(AppError::ExternalApiError(
            "Proxy circuit open, skipping proxy tier".to_string(),
        )),
    }
}
