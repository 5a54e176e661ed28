//! `adsretry simulate` – run the retry loop against a scripted API call.
//!
//! The scripted call fails `failures` times with the configured API error and
//! then succeeds, or fails with a non-API error when `unexpected` is set. By
//! default delays are recorded rather than slept so the run finishes at once.

use adsretry_core::config::AdsRetryConfig;
use adsretry_core::retry::{
    ApiError, AttemptOutcome, RecordingSleeper, RetryExecutor, RetryFailure, RetryRun, Sleeper,
    ThreadSleeper,
};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

const OPERATION: &str = "simulated_call";

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub code: Option<String>,
    pub message: String,
    pub failures: u32,
    pub unexpected: bool,
    pub seed: Option<u64>,
    pub sleep: bool,
    pub json: bool,
}

/// Non-API failure used for `--unexpected`; never downcasts to `ApiError`.
#[derive(Debug, thiserror::Error)]
#[error("simulated transport failure")]
struct TransportFailure;

#[derive(Debug, Serialize)]
struct AttemptRow {
    attempt: u32,
    delay_before_ms: u64,
    outcome: String,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    operation: String,
    invocations: u32,
    total_delay_ms: u64,
    attempts: Vec<AttemptRow>,
    outcome: String,
    reason: Option<String>,
}

fn scripted_error(opts: &SimulateOptions) -> ApiError {
    match &opts.code {
        Some(code) => ApiError::with_code(code.as_str(), opts.message.as_str()),
        None => ApiError::new(opts.message.as_str()),
    }
}

fn simulate_with<S: Sleeper>(executor: &RetryExecutor<S>, opts: &SimulateOptions) -> RetryRun<u32> {
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let api_error = scripted_error(opts);
    let mut calls = 0u32;
    executor.run::<ApiError, u32, _, _>(OPERATION, &mut rng, || {
        calls += 1;
        if opts.unexpected {
            return Err(TransportFailure.into());
        }
        if calls <= opts.failures {
            return Err(api_error.clone().into());
        }
        Ok(calls)
    })
}

fn build_report(run: RetryRun<u32>) -> SimulationReport {
    let attempts = run
        .attempts
        .iter()
        .map(|a| AttemptRow {
            attempt: a.index + 1,
            delay_before_ms: a.delay_before.as_millis() as u64,
            outcome: match &a.outcome {
                AttemptOutcome::Success => "success".to_string(),
                AttemptOutcome::Failed {
                    summary,
                    retryable: true,
                } => format!("retryable: {}", summary),
                AttemptOutcome::Failed {
                    summary,
                    retryable: false,
                } => format!("fatal: {}", summary),
                AttemptOutcome::Unexpected { summary } => format!("unexpected: {}", summary),
            },
        })
        .collect();
    let invocations = run.invocations();
    let total_delay_ms = run.total_delay().as_millis() as u64;

    let (outcome, reason) = match run.result {
        Ok(value) => (format!("ok: call #{} succeeded", value), None),
        Err(err) => match err.downcast_ref::<RetryFailure<ApiError>>() {
            Some(failure) => (
                format!("{:#}", err),
                Some(failure.reason().as_str().to_string()),
            ),
            None => (format!("unexpected error: {:#}", err), None),
        },
    };

    SimulationReport {
        operation: OPERATION.to_string(),
        invocations,
        total_delay_ms,
        attempts,
        outcome,
        reason,
    }
}

fn print_report(report: &SimulationReport) {
    println!("  {:>7}  {:>10}  {}", "Attempt", "Delay(ms)", "Outcome");
    println!("  {}  {}  {}", "-------", "----------", "-------");
    for row in &report.attempts {
        println!(
            "  {:>7}  {:>10}  {}",
            row.attempt, row.delay_before_ms, row.outcome
        );
    }
    println!(
        "{} invocation(s), {} ms total backoff",
        report.invocations, report.total_delay_ms
    );
    match &report.reason {
        Some(reason) => println!("failed [{}]: {}", reason, report.outcome),
        None => println!("{}", report.outcome),
    }
}

pub fn run_simulate(cfg: &AdsRetryConfig, opts: &SimulateOptions) -> Result<()> {
    let executor = cfg.executor()?;
    tracing::info!(
        failures = opts.failures,
        unexpected = opts.unexpected,
        sleep = opts.sleep,
        "starting simulation"
    );
    let run = if opts.sleep {
        simulate_with(&executor.with_sleeper(ThreadSleeper), opts)
    } else {
        simulate_with(&executor.with_sleeper(RecordingSleeper::new()), opts)
    };
    let report = build_report(run);
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
