// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for unihttp
//!
//! Every failure that leaves the crate is an [`HttpError`] carrying one of the
//! fixed [`ErrorCode`]s. Adapters translate native transport failures into
//! `HttpError` at their boundary; the client wraps anything else as
//! [`ErrorCode::Unknown`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::http::{HttpResponse, RequestConfig, ResponseData};

/// Result type alias for unihttp operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// Fixed error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Transport-level failure (DNS, connection refused, reset)
    NetworkError,
    /// Deadline exceeded
    Timeout,
    /// Caller-initiated abort
    Cancelled,
    /// Malformed or unconvertible body
    InvalidResponse,
    /// HTTP 5xx
    ServerError,
    /// HTTP 4xx
    ClientError,
    /// Anything unclassified
    Unknown,
}

impl ErrorCode {
    /// Wire name of the code, e.g. `NETWORK_ERROR`
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::InvalidResponse => "INVALID_RESPONSE",
            ErrorCode::ServerError => "SERVER_ERROR",
            ErrorCode::ClientError => "CLIENT_ERROR",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }

    /// Classify an HTTP status; `None` below 400
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            500.. => Some(ErrorCode::ServerError),
            400..=499 => Some(ErrorCode::ClientError),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying cause attached to an [`HttpError`]
#[derive(Error, Debug)]
pub enum TransportError {
    /// reqwest transport failure (browser / React-Native adapters)
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// Local file I/O (upload source, download target)
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Body (de)serialization
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Failure reported by a host bridge (mini-program errMsg, HarmonyOS message)
    #[error("{0}")]
    Native(String),

    /// Failure raised by caller code, e.g. an interceptor
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Typed error returned by every public operation
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct HttpError {
    /// Classification
    pub code: ErrorCode,
    /// Human readable message
    pub message: String,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// Native or internal cause
    #[source]
    pub original_error: Option<Arc<TransportError>>,
    /// Config of the failed request
    pub config: Option<RequestConfig>,
    /// Partial response for status failures
    pub response: Option<Box<HttpResponse<ResponseData>>>,
}

impl HttpError {
    /// Create a new error with code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            original_error: None,
            config: None,
            response: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Cancelled, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidResponse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }

    /// Error for a received response with status >= 400
    ///
    /// Returns an `Unknown`-coded error if `status` is not an error status.
    pub fn from_status(message: impl Into<String>, response: HttpResponse<ResponseData>) -> Self {
        let status = response.status;
        let code = ErrorCode::from_status(status).unwrap_or(ErrorCode::Unknown);
        let config = response.config.clone();
        Self {
            code,
            message: message.into(),
            status: Some(status),
            original_error: None,
            config: Some(config),
            response: Some(Box::new(response)),
        }
    }

    /// Error for an adapter that lacks an optional capability
    pub fn unsupported(operation: &str) -> Self {
        Self::unknown(format!("{} not supported on this platform", operation))
    }

    /// Attach an underlying cause
    pub fn with_source(mut self, source: impl Into<TransportError>) -> Self {
        self.original_error = Some(Arc::new(source.into()));
        self
    }

    /// Attach the request config
    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Attach the request config unless one is already present
    pub fn or_config(mut self, config: &RequestConfig) -> Self {
        if self.config.is_none() {
            self.config = Some(config.clone());
        }
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::Cancelled
    }

    pub fn is_network(&self) -> bool {
        self.code == ErrorCode::NetworkError
    }

    /// Every code except `Cancelled` may be retried
    pub fn is_retryable(&self) -> bool {
        !self.is_cancelled()
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.code == ErrorCode::ClientError
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.code == ErrorCode::ServerError
    }

    /// URL of the failed request, if known
    pub fn url(&self) -> Option<&str> {
        self.config.as_ref().map(|c| c.url.as_str())
    }

    /// Serializable form for logging
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "name": "HttpError",
            "code": self.code,
            "message": self.message,
            "status": self.status,
            "originalError": self.original_error.as_ref().map(|e| e.to_string()),
            "config": self.config.as_ref().map(RequestConfig::summary),
        })
    }
}

impl From<anyhow::Error> for HttpError {
    fn from(err: anyhow::Error) -> Self {
        HttpError::unknown(err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::invalid_response(format!("Invalid response body: {}", err)).with_source(err)
    }
}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        HttpError::unknown(format!("I/O error: {}", err)).with_source(err)
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Attach request config to the error if it has none
    fn with_config(self, config: &RequestConfig) -> Result<T>;

    /// Prefix the error message
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<HttpError>> ErrorContext<T> for std::result::Result<T, E> {
    fn with_config(self, config: &RequestConfig) -> Result<T> {
        self.map_err(|e| e.into().or_config(config))
    }

    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let mut err = e.into();
            err.message = format!("{}: {}", msg, err.message);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Headers;

    fn response(status: u16) -> HttpResponse<ResponseData> {
        HttpResponse::new(
            ResponseData::Text("nope".into()),
            status,
            "x",
            Headers::new(),
            RequestConfig::new("/items"),
        )
    }

    #[test]
    fn test_status_classification() {
        let err = HttpError::from_status("Request failed with status 404", response(404));
        assert!(err.is_client_error());
        assert_eq!(err.status, Some(404));
        assert_eq!(err.url(), Some("/items"));
        assert!(err.response.is_some());

        let err = HttpError::from_status("Request failed with status 503", response(503));
        assert!(err.is_server_error());
        assert_eq!(ErrorCode::from_status(200), None);
    }

    #[test]
    fn test_retryable() {
        assert!(HttpError::timeout("slow").is_retryable());
        assert!(HttpError::network("down").is_retryable());
        assert!(!HttpError::cancelled("stop").is_retryable());
    }

    #[test]
    fn test_to_json() {
        let err = HttpError::network("Network error")
            .with_source(TransportError::Native("request:fail".into()))
            .with_config(RequestConfig::new("/a"));
        let value = err.to_json();

        assert_eq!(value["code"], "NETWORK_ERROR");
        assert_eq!(value["message"], "Network error");
        assert_eq!(value["originalError"], "request:fail");
        assert_eq!(value["config"]["url"], "/a");
    }

    #[test]
    fn test_anyhow_becomes_unknown() {
        let err: HttpError = anyhow::anyhow!("interceptor bug").into();
        assert_eq!(err.code, ErrorCode::Unknown);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_context() {
        let res: std::result::Result<(), HttpError> = Err(HttpError::timeout("Request timeout"));
        let err = res.context("download").unwrap_err();
        assert_eq!(err.message, "download: Request timeout");
        assert!(err.is_timeout());
    }
}
