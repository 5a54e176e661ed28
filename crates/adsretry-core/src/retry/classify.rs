//! Classify API errors as retryable (transient) or fatal.
//!
//! Matching is deliberately conservative: an error is retried only when its
//! code or message matches a known transient pattern. Everything else is fatal
//! so that permanent failures (bad credentials, invalid queries) surface fast.

use std::fmt;

use super::error::ApiFailure;

/// Error codes retried when found (case-insensitively) inside the API error code.
pub const DEFAULT_RETRYABLE_CODES: &[&str] = &[
    "INTERNAL_ERROR",
    "QUOTA_ERROR",
    "RATE_EXCEEDED",
    "CONCURRENT_MODIFICATION",
    "PARTIAL_FAILURE_ERROR",
];

/// Phrases retried when found in the lower-cased error message.
pub const DEFAULT_RETRYABLE_PHRASES: &[&str] = &[
    "internal error",
    "rate exceeded",
    "quota exceeded",
    "timeout",
    "temporary failure",
    "service unavailable",
];

/// Which rule made an error retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchedRule {
    Code(String),
    Phrase(String),
}

impl fmt::Display for MatchedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchedRule::Code(code) => write!(f, "code {}", code),
            MatchedRule::Phrase(phrase) => write!(f, "phrase {:?}", phrase),
        }
    }
}

/// An API error annotated with the classifier's verdict.
#[derive(Debug)]
pub struct ClassifiedError<'a, E: ?Sized> {
    pub error: &'a E,
    /// Structured code, if the error carried one.
    pub code: Option<String>,
    /// Stringified error used for phrase matching.
    pub message: String,
    pub retryable: bool,
    pub rule: Option<MatchedRule>,
}

/// Allow-list based classifier. Built once, shared read-only across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassifier {
    codes: Vec<String>,
    phrases: Vec<String>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RETRYABLE_CODES, DEFAULT_RETRYABLE_PHRASES)
    }
}

impl ErrorClassifier {
    /// Build a classifier from code and phrase lists.
    ///
    /// Codes are upper-cased and phrases lower-cased so matching is
    /// case-insensitive on both sides. Blank entries are dropped; an empty
    /// entry would otherwise match every error.
    pub fn new<C, P>(codes: C, phrases: P) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let codes = codes
            .into_iter()
            .map(|c| c.as_ref().trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { codes, phrases }
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// True if the error should be retried.
    pub fn classify<E: ApiFailure + ?Sized>(&self, error: &E) -> bool {
        self.matched_rule(error).is_some()
    }

    /// The rule that makes this error retryable, or `None` if it is fatal.
    pub fn matched_rule<E: ApiFailure + ?Sized>(&self, error: &E) -> Option<MatchedRule> {
        let code = error.error_code();
        self.match_parts(code.as_deref(), &error.to_string())
    }

    /// Classify and keep the extracted code and message for diagnostics.
    pub fn inspect<'a, E: ApiFailure + ?Sized>(&self, error: &'a E) -> ClassifiedError<'a, E> {
        let code = error.error_code();
        let message = error.to_string();
        let rule = self.match_parts(code.as_deref(), &message);
        ClassifiedError {
            error,
            code,
            message,
            retryable: rule.is_some(),
            rule,
        }
    }

    fn match_parts(&self, code: Option<&str>, message: &str) -> Option<MatchedRule> {
        if let Some(code) = code {
            let code = code.to_uppercase();
            if let Some(hit) = self.codes.iter().find(|c| code.contains(c.as_str())) {
                return Some(MatchedRule::Code(hit.clone()));
            }
        }
        let message = message.to_lowercase();
        self.phrases
            .iter()
            .find(|p| message.contains(p.as_str()))
            .map(|p| MatchedRule::Phrase(p.clone()))
    }
}
