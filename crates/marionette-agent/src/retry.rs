// Path: crates/marionette-agent/src/retry.rs

use marionette_telemetry::{error_metrics, operator_metrics};
use marionette_types::config::RetryConfig;
use marionette_types::error::{ErrorCode, OperatorError, RetryClass};
use std::future::Future;

/// Immediate-retry wrapper with one attempt budget per operation class.
///
/// Every error consumes one attempt regardless of its kind. The configured
/// `max_retries` is the total number of attempts, so a budget of 3 means at
/// most 3 calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn attempts(&self, class: RetryClass) -> u32 {
        self.config.budget(class).attempts()
    }

    /// Runs `op` until it succeeds or the class budget is spent.
    pub async fn run<T, F, Fut>(&self, class: RetryClass, mut op: F) -> Result<T, OperatorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OperatorError>>,
    {
        let attempts = self.attempts(class);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    error_metrics().inc_error("operator", e.code());
                    if attempt < attempts {
                        operator_metrics().inc_retry_attempts(class.as_str());
                        tracing::warn!(
                            target: "agent",
                            %class,
                            attempt,
                            attempts,
                            error = %e,
                            "Attempt failed, retrying"
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        operator_metrics().inc_retries_exhausted(class.as_str());
        let last_error = last_error.map(|e| e.to_string()).unwrap_or_default();
        tracing::error!(target: "agent", %class, attempts, error = %last_error, "Retry budget exhausted");
        Err(OperatorError::RetriesExhausted {
            class,
            attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_types::config::RetryBudget;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(execute: u32) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            execute: RetryBudget::new(execute),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn three_failures_with_budget_three_make_three_calls() {
        let calls = AtomicU32::new(0);
        let err = policy(3)
            .run(RetryClass::Execute, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(OperatorError::Transport("timeout".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            err,
            OperatorError::RetriesExhausted {
                class: RetryClass::Execute,
                attempts: 3,
                last_error: "Transport error: timeout".into(),
            }
        );
    }

    #[tokio::test]
    async fn success_stops_retrying() {
        let calls = AtomicU32::new(0);
        let value = policy(5)
            .run(RetryClass::Execute, || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 2 {
                    Err(OperatorError::Capture("black frame".into()))
                } else {
                    Ok(n)
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_budget_still_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let _ = policy(0)
            .run(RetryClass::Execute, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(OperatorError::Input("denied".into()))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_budgets() {
        let p = RetryPolicy::default();
        assert_eq!(p.attempts(RetryClass::Model), 5);
        assert_eq!(p.attempts(RetryClass::Screenshot), 5);
        assert_eq!(p.attempts(RetryClass::Execute), 1);
    }
}
