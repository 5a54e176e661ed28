//! Integration tests: retry executor driven by a scripted API call.
//!
//! Delays are captured with `RecordingSleeper`, so nothing here actually sleeps.

mod common;

use std::sync::Arc;
use std::time::Duration;

use adsretry_core::retry::{
    ApiError, ErrorClassifier, FailureReason, RecordingSleeper, RetryConfig, RetryExecutor,
    RetryFailure,
};
use common::scripted::{auth_failure, rate_exceeded, ScriptedCall, Step};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn config(max_attempts: u32, jitter: bool) -> RetryConfig {
    RetryConfig::new(
        max_attempts,
        Duration::from_secs(1),
        Duration::from_secs(30),
        2.0,
        jitter,
    )
    .unwrap()
}

fn recording(config: RetryConfig) -> RetryExecutor<RecordingSleeper> {
    RetryExecutor::new(config).with_sleeper(RecordingSleeper::new())
}

fn failure(err: &anyhow::Error) -> &RetryFailure<ApiError> {
    err.downcast_ref::<RetryFailure<ApiError>>()
        .expect("expected RetryFailure<ApiError>")
}

#[test]
fn rate_exceeded_three_attempts_sleeps_one_then_two_seconds() {
    let ex = recording(config(3, false));
    let call = ScriptedCall::always(rate_exceeded());

    let err = ex
        .execute::<ApiError, _, _>("get_report", || call.call())
        .unwrap_err();

    assert_eq!(call.calls(), 3);
    assert_eq!(
        ex.sleeper().recorded(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
    let f = failure(&err);
    assert_eq!(f.reason(), FailureReason::Exhausted);
    assert_eq!(f.attempt_count(), 3);
    assert_eq!(f.max_attempts(), 3);
    assert_eq!(f.original_error().request_id.as_deref(), Some("req-1"));
    // The causal chain is kept for `{:#}` rendering.
    let rendered = format!("{:#}", err);
    assert!(rendered.contains("max retries exceeded for get_report"));
    assert!(rendered.contains("RATE_EXCEEDED: Too many requests"));
}

#[test]
fn permanently_failing_call_is_invoked_exactly_max_attempts_times() {
    for n in 1..=6 {
        let ex = recording(config(n, true));
        let call = ScriptedCall::always(rate_exceeded());
        let err = ex
            .execute::<ApiError, _, _>("get_report", || call.call())
            .unwrap_err();

        assert_eq!(call.calls(), n, "max_attempts = {}", n);
        assert_eq!(failure(&err).attempt_count(), n);
        assert_eq!(failure(&err).reason(), FailureReason::Exhausted);
        // Sleeps happen only between attempts.
        assert_eq!(ex.sleeper().recorded().len() as u32, n - 1);
    }
}

#[test]
fn fatal_error_on_first_attempt_stops_immediately() {
    let ex = recording(config(5, true));
    let call = ScriptedCall::new(vec![auth_failure(), Step::Succeed(1)]);

    let err = ex
        .execute::<ApiError, _, _>("get_report", || call.call())
        .unwrap_err();

    assert_eq!(call.calls(), 1);
    assert!(ex.sleeper().recorded().is_empty());
    let f = failure(&err);
    assert_eq!(f.reason(), FailureReason::NonRetryable);
    assert_eq!(f.attempt_count(), 1);
    assert_eq!(
        f.original_error().code.as_deref(),
        Some("AUTHENTICATION_ERROR")
    );
}

#[test]
fn success_on_attempt_k_invokes_k_plus_one_times() {
    for k in 0..4u32 {
        let ex = recording(config(5, false));
        let mut steps = vec![rate_exceeded(); k as usize];
        steps.push(Step::Succeed(7));
        let call = ScriptedCall::new(steps);

        let value = ex
            .execute::<ApiError, _, _>("get_report", || call.call())
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(call.calls(), k + 1);
        assert_eq!(ex.sleeper().recorded().len() as u32, k);
    }
}

#[test]
fn unexpected_error_propagates_with_budget_left() {
    let ex = recording(config(10, true));
    let call = ScriptedCall::new(vec![
        Step::Unexpected("connection pool poisoned"),
        Step::Succeed(1),
    ]);

    let err = ex
        .execute::<ApiError, _, _>("get_report", || call.call())
        .unwrap_err();

    assert_eq!(call.calls(), 1);
    assert!(ex.sleeper().recorded().is_empty());
    assert!(err.downcast_ref::<RetryFailure<ApiError>>().is_none());
    assert_eq!(err.to_string(), "connection pool poisoned");
    assert!(err.downcast_ref::<std::io::Error>().is_some());
}

#[test]
fn unexpected_error_after_retries_is_still_unwrapped() {
    let ex = recording(config(5, false));
    let call = ScriptedCall::new(vec![rate_exceeded(), Step::Unexpected("decode failed")]);

    let err = ex
        .execute::<ApiError, _, _>("get_report", || call.call())
        .unwrap_err();

    assert_eq!(call.calls(), 2);
    assert_eq!(ex.sleeper().recorded(), vec![Duration::from_secs(1)]);
    assert_eq!(err.to_string(), "decode failed");
}

#[test]
fn message_only_errors_are_classified_by_phrase() {
    let ex = recording(config(2, false));
    let call = ScriptedCall::new(vec![
        Step::Api(ApiError::new("The service is temporarily unavailable: Service Unavailable")),
        Step::Succeed(3),
    ]);
    let value = ex
        .execute::<ApiError, _, _>("get_report", || call.call())
        .unwrap();
    assert_eq!(value, 3);
    assert_eq!(call.calls(), 2);
}

#[test]
fn custom_classifier_changes_verdicts() {
    let classifier = ErrorClassifier::new(["AUTHENTICATION_ERROR"], Vec::<String>::new());
    let ex = RetryExecutor::with_classifier(config(2, false), classifier)
        .with_sleeper(RecordingSleeper::new());

    let call = ScriptedCall::always(auth_failure());
    let err = ex
        .execute::<ApiError, _, _>("get_report", || call.call())
        .unwrap_err();
    assert_eq!(call.calls(), 2);
    assert_eq!(failure(&err).reason(), FailureReason::Exhausted);

    let call = ScriptedCall::always(rate_exceeded());
    let err = ex
        .execute::<ApiError, _, _>("get_report", || call.call())
        .unwrap_err();
    assert_eq!(call.calls(), 1);
    assert_eq!(failure(&err).reason(), FailureReason::NonRetryable);
}

#[test]
fn seeded_jitter_gives_reproducible_delays_within_band() {
    let run_once = |seed: u64| {
        let ex = recording(config(6, true));
        let call = ScriptedCall::always(rate_exceeded());
        let mut rng = StdRng::seed_from_u64(seed);
        let _ = ex.execute_with_rng::<ApiError, _, _, _>("get_report", &mut rng, || call.call());
        ex.sleeper().recorded()
    };

    let first = run_once(99);
    assert_eq!(first, run_once(99));
    assert_eq!(first.len(), 5);
    for (i, d) in first.iter().enumerate() {
        let nominal = Duration::from_secs(1 << i);
        assert!(*d >= nominal / 2 && *d <= nominal, "delay {} = {:?}", i, d);
    }
}

#[test]
fn executor_is_shareable_across_threads() {
    let ex = Arc::new(recording(config(3, true)));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ex = Arc::clone(&ex);
            std::thread::spawn(move || {
                let call = ScriptedCall::new(vec![rate_exceeded(), Step::Succeed(5)]);
                let value = ex
                    .execute::<ApiError, _, _>("get_report", || call.call())
                    .unwrap();
                (value, call.calls())
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), (5, 2));
    }
    assert_eq!(ex.sleeper().recorded().len(), 4);
}
