//! `adsretry classify` – show the classifier's verdict for an API error.

use adsretry_core::config::AdsRetryConfig;
use adsretry_core::retry::{ApiError, ErrorClassifier};
use anyhow::Result;

fn verdict(classifier: &ErrorClassifier, code: Option<&str>, message: &str) -> String {
    let err = match code {
        Some(code) => ApiError::with_code(code, message),
        None => ApiError::new(message),
    };
    match classifier.inspect(&err).rule {
        Some(rule) => format!("retryable (matched {})", rule),
        None => "fatal (no retryable code or phrase matched)".to_string(),
    }
}

pub fn run_classify(cfg: &AdsRetryConfig, code: Option<&str>, message: &str) -> Result<()> {
    println!("{}", verdict(&cfg.classifier(), code, message));
    Ok(())
}
