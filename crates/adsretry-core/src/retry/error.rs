//! API error types the retry engine knows how to classify.

use std::fmt;

/// An error from the remote API that the retry engine can classify.
///
/// Classification looks at the optional structured code first and then at the
/// stringified error (`Display`), so implementors should render the vendor's
/// message there.
pub trait ApiFailure: std::error::Error + Send + Sync + 'static {
    /// Structured error code reported by the API, if the error carries one.
    fn error_code(&self) -> Option<String> {
        None
    }
}

/// A failure reported by the advertising-platform API for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Vendor error code (e.g. `RATE_EXCEEDED`, `quota_error: RESOURCE_EXHAUSTED`).
    pub code: Option<String>,
    /// Human-readable message from the API.
    pub message: String,
    /// Request id echoed by the API, useful when filing support tickets.
    pub request_id: Option<String>,
}

impl ApiError {
    /// Error without a structured code; only the message can be classified.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            request_id: None,
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            request_id: None,
        }
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message)?,
            None => write!(f, "{}", self.message)?,
        }
        if let Some(id) = &self.request_id {
            write!(f, " (request_id={})", id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ApiFailure for ApiError {
    fn error_code(&self) -> Option<String> {
        self.code.clone()
    }
}
