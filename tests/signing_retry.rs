//! Retry behaviour of the signing pipeline against scripted signers.

use kodegen_bundler_finalize::bundler::{
    Error,
    sign::{CodeSigner, RetryPolicy, SignOutcome, SignPlan, SignRequest, SigningPipeline},
};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const BASE: Duration = Duration::from_millis(20);

/// Replays scripted outcomes, then succeeds.
struct ScriptedSigner {
    script: Mutex<VecDeque<SignOutcome>>,
    calls: Mutex<Vec<PathBuf>>,
}

impl ScriptedSigner {
    fn new(script: Vec<SignOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl CodeSigner for ScriptedSigner {
    async fn sign(&self, request: &SignRequest) -> SignOutcome {
        self.calls.lock().unwrap().push(request.target.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SignOutcome::Success)
    }
}

/// Fails transiently forever.
struct AlwaysBusy;

impl CodeSigner for AlwaysBusy {
    async fn sign(&self, _request: &SignRequest) -> SignOutcome {
        SignOutcome::TransientFailure("timestamp service unavailable".into())
    }
}

fn policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: BASE,
    }
}

fn busy() -> SignOutcome {
    SignOutcome::TransientFailure("resource busy".into())
}

#[tokio::test]
async fn succeeds_on_third_attempt_after_doubling_delays() {
    let signer = ScriptedSigner::new(vec![busy(), busy()]);
    let mut pipeline = SigningPipeline::new(signer, policy());

    let started = Instant::now();
    pipeline
        .sign(&SignRequest::deep("Viewer.app"))
        .await
        .unwrap();

    assert!(started.elapsed() >= BASE * 3);
    let attempts = pipeline.attempts();
    assert_eq!(attempts.len(), 3);
    assert_eq!(
        attempts.iter().map(|a| a.backoff).collect::<Vec<_>>(),
        vec![Some(BASE), Some(BASE * 2), None]
    );
    assert_eq!(attempts[2].outcome, SignOutcome::Success);
    assert_eq!(attempts[2].attempt_number, 3);
}

#[tokio::test]
async fn exhausts_the_bound_and_reports_a_signing_error() {
    let mut pipeline = SigningPipeline::new(AlwaysBusy, policy());

    let err = pipeline
        .sign(&SignRequest::plain("libvlc.dylib"))
        .await
        .unwrap_err();

    assert_eq!(pipeline.attempts().len(), 3);
    match err {
        Error::Signing {
            target, attempts, ..
        } => {
            assert_eq!(target, PathBuf::from("libvlc.dylib"));
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn fatal_failures_are_not_retried() {
    let signer = ScriptedSigner::new(vec![SignOutcome::FatalFailure(
        "no identity found".into(),
    )]);
    let mut pipeline = SigningPipeline::new(signer, policy());

    let err = pipeline.sign(&SignRequest::deep("Viewer.app")).await.unwrap_err();

    assert!(matches!(err, Error::Signing { attempts: 1, .. }));
    assert_eq!(pipeline.attempts().len(), 1);
}

#[tokio::test]
async fn each_target_gets_its_own_budget_in_plan_order() {
    // Two transient failures on the first target, two on the second: both
    // succeed because budgets are per target.
    let signer = ScriptedSigner::new(vec![busy(), busy(), SignOutcome::Success, busy(), busy()]);
    let plan = SignPlan::new()
        .deep("Viewer.app")
        .plain("Viewer.app/Contents/Resources/libvlc.dylib");
    let mut pipeline = SigningPipeline::new(signer, policy());

    pipeline.run(&plan).await.unwrap();

    let targets: Vec<_> = pipeline
        .attempts()
        .iter()
        .map(|a| (a.target.clone(), a.attempt_number))
        .collect();
    let plain = PathBuf::from("Viewer.app/Contents/Resources/libvlc.dylib");
    let deep = PathBuf::from("Viewer.app");
    assert_eq!(
        targets,
        vec![
            (plain.clone(), 1),
            (plain.clone(), 2),
            (plain, 3),
            (deep.clone(), 1),
            (deep.clone(), 2),
            (deep, 3),
        ]
    );
}
