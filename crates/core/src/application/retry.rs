// Lock-aware retry executor
//
// Runs package-manager commands and, when the output says another process
// holds the package-manager lock, waits and tries again.
use crate::domain::{LockDetectionPolicy, RetrySettings};
use crate::error::{PackageError, Result};
use crate::port::{
    ActionLogger, CommandExecutor, CommandSpec, ExecutionMode, ExecutionResult, Sleeper,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Info line emitted before every lock-contention sleep
pub fn lock_acquired_message(sleep: Duration, reason: &str) -> String {
    format!(
        "Package manager lock is acquired. Retrying after {} seconds. Reason: {}",
        sleep.as_secs_f64(),
        reason
    )
}

/// Command runner that retries while the package manager is locked
///
/// Each call makes at most `locked_tries` attempts and sleeps
/// `locked_try_sleep` between them, never after the last one. Only failures
/// whose text matches the [`LockDetectionPolicy`] are retried; anything else
/// is returned on the spot. A zero exit whose output still carries a lock
/// banner is retried as well.
pub struct LockAwareExecutor {
    executor: Arc<dyn CommandExecutor>,
    sleeper: Arc<dyn Sleeper>,
    logger: Arc<dyn ActionLogger>,
    policy: Arc<LockDetectionPolicy>,
    settings: RetrySettings,
}

impl LockAwareExecutor {
    /// Create a new lock-aware executor
    ///
    /// # Arguments
    /// * `executor` - Runs the actual command
    /// * `sleeper` - Waits between attempts
    /// * `logger` - Receives the lock-retry info lines
    /// * `policy` - Lock-wait signatures of the active package manager
    /// * `settings` - Attempt budget and pause length
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        sleeper: Arc<dyn Sleeper>,
        logger: Arc<dyn ActionLogger>,
        policy: Arc<LockDetectionPolicy>,
        settings: RetrySettings,
    ) -> Self {
        Self {
            executor,
            sleeper,
            logger,
            policy,
            settings,
        }
    }

    pub fn settings(&self) -> RetrySettings {
        self.settings
    }

    pub fn policy(&self) -> &LockDetectionPolicy {
        &self.policy
    }

    pub fn logger(&self) -> &Arc<dyn ActionLogger> {
        &self.logger
    }

    /// Run unchecked: a non-zero exit comes back as a result, not an error
    pub async fn call_until_not_locked(&self, command: &CommandSpec) -> Result<ExecutionResult> {
        self.wait_until_not_locked(command, ExecutionMode::Unchecked)
            .await
    }

    /// Run checked: a non-zero exit becomes [`PackageError::CommandFailure`]
    pub async fn checked_call_until_not_locked(
        &self,
        command: &CommandSpec,
    ) -> Result<ExecutionResult> {
        self.wait_until_not_locked(command, ExecutionMode::Checked)
            .await
    }

    pub async fn wait_until_not_locked(
        &self,
        command: &CommandSpec,
        mode: ExecutionMode,
    ) -> Result<ExecutionResult> {
        let tries = self.settings.locked_tries.max(1);
        let mut attempt = 1;

        loop {
            let is_last_attempt = attempt >= tries;

            let reason = match self.executor.run(command, mode).await {
                Ok(result) => {
                    if is_last_attempt || !self.policy.is_locked_output(&result.output) {
                        return Ok(result);
                    }
                    result.output
                }
                Err(err) => {
                    let text = err.to_string();
                    if is_last_attempt || !self.policy.is_locked_output(&text) {
                        return Err(PackageError::from_execution(err, attempt));
                    }
                    text
                }
            };

            debug!(
                command = %command,
                attempt = attempt,
                locked_tries = tries,
                "Package manager lock detected"
            );
            self.logger
                .info(&lock_acquired_message(self.settings.locked_try_sleep, &reason));
            self.sleeper.sleep(self.settings.locked_try_sleep).await;

            attempt += 1;
        }
    }
}
