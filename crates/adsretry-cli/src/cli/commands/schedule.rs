//! `adsretry schedule` – print the backoff delays for the configured policy.

use adsretry_core::config::AdsRetryConfig;
use adsretry_core::retry::{RetryConfig, ScheduleStep};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

fn format_secs(d: Duration) -> String {
    format!("{:.3}", d.as_secs_f64())
}

/// Table row for a single retry, or a summary line for a folded run.
fn step_line(step: &ScheduleStep, max_delay: Duration, sampled: Option<Duration>) -> String {
    if step.is_single() {
        let sampled = sampled.map_or_else(|| "-".to_string(), format_secs);
        return format!(
            "  {:>5}  {:>10}  {:>10}",
            step.first_retry,
            format_secs(step.delay),
            sampled
        );
    }
    if step.delay >= max_delay {
        format!(
            "retries {}..{}: max_delay ({}s each)",
            step.first_retry,
            step.last_retry,
            format_secs(step.delay)
        )
    } else {
        format!(
            "retries {}..{}: up to {}s each",
            step.first_retry,
            step.last_retry,
            format_secs(step.delay)
        )
    }
}

/// Output lines for `schedule`. Jittered samples are drawn only for listed retries.
fn render_schedule(retry: &RetryConfig, seed: Option<u64>) -> Vec<String> {
    let scheduler = retry.scheduler();
    let mut lines = vec![format!(
        "max_attempts={} base={:?} max={:?} factor={} jitter={}",
        retry.max_attempts(),
        retry.base_delay(),
        retry.max_delay(),
        retry.backoff_factor(),
        retry.jitter()
    )];
    let steps = scheduler.nominal_schedule();
    if steps.is_empty() {
        lines.push("No retries: a single attempt is made.".to_string());
        return lines;
    }

    let mut rng = seed.map(StdRng::seed_from_u64);
    lines.push(format!("  {:>5}  {:>10}  {:>10}", "Retry", "Nominal(s)", "Sampled(s)"));
    lines.push(format!("  {}  {}  {}", "-----", "----------", "----------"));
    for step in &steps {
        let sampled = match rng.as_mut() {
            Some(rng) if step.is_single() => Some(scheduler.delay_for(step.first_retry - 1, rng)),
            _ => None,
        };
        lines.push(step_line(step, retry.max_delay(), sampled));
    }
    lines
}

pub fn run_schedule(cfg: &AdsRetryConfig, seed: Option<u64>) -> Result<()> {
    let retry = cfg.retry_config()?;
    for line in render_schedule(&retry, seed) {
        println!("{}", line);
    }
    Ok(())
}
