// src/errors.rs
use std::fmt;
use thiserror::Error;

/// Shown when a failed call produced neither a server `detail` nor a
/// transport message and no per-operation fallback was applied.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Operation failed";

/// Normalized outcome of a failed backend call. `status_code` is `None` for
/// network-level failures where no response was received at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub status_code: Option<u16>,
    pub message: Option<String>,
}

impl GatewayError {
    pub fn transport(err: impl fmt::Display) -> Self {
        Self {
            status_code: None,
            message: Some(err.to_string()),
        }
    }

    pub fn http(status_code: u16, detail: Option<String>) -> Self {
        Self {
            status_code: Some(status_code),
            message: detail,
        }
    }

    /// Fills in the operation-specific message when the server sent no
    /// usable `detail`. The server's own message always wins.
    pub fn with_fallback(mut self, fallback: &str) -> Self {
        if self.message.as_deref().is_none_or(|m| m.trim().is_empty()) {
            self.message = Some(fallback.to_string());
        }
        self
    }

    pub fn display_message(&self, fallback: &str) -> String {
        match &self.message {
            Some(message) if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_network(&self) -> bool {
        self.status_code.is_none()
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_message(DEFAULT_FAILURE_MESSAGE))
    }
}

impl std::error::Error for GatewayError {}

#[derive(Error, Debug)]
pub enum LeafscanError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Gateway(GatewayError),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Another request is already in progress")]
    Busy,
}

impl From<GatewayError> for LeafscanError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_server_detail_when_present() {
        let err = GatewayError::http(404, Some("Analysis not found".to_string()));
        assert_eq!(err.to_string(), "Analysis not found");
    }

    #[test]
    fn display_falls_back_to_default_message() {
        let err = GatewayError::http(500, None);
        assert_eq!(err.to_string(), DEFAULT_FAILURE_MESSAGE);
    }

    #[test]
    fn with_fallback_does_not_override_detail() {
        let err = GatewayError::http(422, Some("Analysis failed: bad image".to_string()))
            .with_fallback("Analysis failed");
        assert_eq!(err.to_string(), "Analysis failed: bad image");
    }

    #[test]
    fn with_fallback_fills_empty_message() {
        let err = GatewayError::http(500, Some("   ".to_string())).with_fallback("Upload failed");
        assert_eq!(err.to_string(), "Upload failed");
    }

    #[test]
    fn transport_errors_have_no_status() {
        let err = GatewayError::transport("connection refused");
        assert!(err.is_network());
        assert_eq!(err.to_string(), "connection refused");
    }
}
