//! Retry loop around a [`CodeSigner`].

use super::{CodeSigner, SignOutcome, SignPlan, SignRequest};
use crate::bundler::{
    error::{Error, Result},
    settings::RetrySettings,
};
use std::path::PathBuf;
use std::time::Duration;

/// Attempts per signing target, including the first.
pub const MAX_SIGN_ATTEMPTS: u32 = 3;

/// Attempt bound and backoff base.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per target, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry. Doubles on each further retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay slept after the failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetrySettings::default().into()
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self {
            max_attempts: MAX_SIGN_ATTEMPTS,
            base_delay: settings.base_delay(),
        }
    }
}

/// One recorded signing attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningAttempt {
    /// Target of the attempt.
    pub target: PathBuf,
    /// 1-based attempt number for this target.
    pub attempt_number: u32,
    /// What the signer reported.
    pub outcome: SignOutcome,
    /// Delay slept before the next attempt, if one followed.
    pub backoff: Option<Duration>,
}

/// Signs targets through a [`CodeSigner`], retrying transient failures.
pub struct SigningPipeline<S> {
    signer: S,
    policy: RetryPolicy,
    attempts: Vec<SigningAttempt>,
}

impl<S: CodeSigner> SigningPipeline<S> {
    /// Creates a pipeline.
    pub fn new(signer: S, policy: RetryPolicy) -> Self {
        Self {
            signer,
            policy,
            attempts: Vec::new(),
        }
    }

    /// Every attempt made so far, in order.
    pub fn attempts(&self) -> &[SigningAttempt] {
        &self.attempts
    }

    /// Signs every target of `plan` in order, stopping at the first failure.
    pub async fn run(&mut self, plan: &SignPlan) -> Result<()> {
        let requests = plan.requests();
        for request in &requests {
            self.sign(request).await?;
        }
        if !requests.is_empty() {
            log::info!("✓ Signed {} target(s)", requests.len());
        }
        Ok(())
    }

    /// Signs one target, retrying transient failures up to the bound.
    pub async fn sign(&mut self, request: &SignRequest) -> Result<()> {
        let max = self.policy.max_attempts;
        let mut attempt = 1;

        loop {
            log::info!(
                "Signing {} ({:?}, attempt {}/{})",
                request.target.display(),
                request.mode,
                attempt,
                max
            );
            let reason = match self.signer.sign(request).await {
                SignOutcome::Success => {
                    self.record(request, attempt, SignOutcome::Success, None);
                    return Ok(());
                }
                SignOutcome::FatalFailure(reason) => {
                    let outcome = SignOutcome::FatalFailure(reason.clone());
                    self.record(request, attempt, outcome, None);
                    return Err(self.failure(request, attempt, reason));
                }
                SignOutcome::TransientFailure(reason) => reason,
            };
            let outcome = SignOutcome::TransientFailure(reason.clone());

            if attempt >= max {
                self.record(request, attempt, outcome, None);
                return Err(self.failure(request, attempt, reason));
            }

            let delay = self.policy.backoff(attempt);
            log::warn!(
                "Signing {} failed ({}), retrying in {:?}",
                request.target.display(),
                reason,
                delay
            );
            self.record(request, attempt, outcome, Some(delay));
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn record(
        &mut self,
        request: &SignRequest,
        attempt_number: u32,
        outcome: SignOutcome,
        backoff: Option<Duration>,
    ) {
        self.attempts.push(SigningAttempt {
            target: request.target.clone(),
            attempt_number,
            outcome,
            backoff,
        });
    }

    fn failure(&self, request: &SignRequest, attempts: u32, reason: String) -> Error {
        Error::Signing {
            target: request.target.clone(),
            attempts,
            reason,
        }
    }
}
