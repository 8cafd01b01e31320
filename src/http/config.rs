// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request configuration types and builder

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::abort::AbortSignal;
use super::headers::{APPLICATION_JSON, CONTENT_TYPE};
use super::DEFAULT_TIMEOUT;
use crate::error::{HttpError, Result};

/// Header map; keys keep the caller's case
pub type Headers = BTreeMap<String, String>;

/// Insert `overrides` into `headers`, replacing any key that differs only in case
pub fn override_headers(headers: &mut Headers, overrides: &Headers) {
    for (name, value) in overrides {
        headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        headers.insert(name.clone(), value.clone());
    }
}

/// Query parameters. Keys serialize in sorted order.
pub type Params = serde_json::Map<String, Value>;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Methods that carry a request body
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            other => Err(HttpError::unknown(format!("Unsupported method: {}", other))),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Expected response body format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Json,
    Text,
    #[serde(rename = "arraybuffer")]
    ArrayBuffer,
}

/// Request body
#[derive(Debug, Clone, PartialEq)]
pub enum RequestData {
    /// Structured data; serialized according to the content type
    Json(Value),
    /// Sent as-is
    Text(String),
    /// Sent as-is
    Binary(Bytes),
}

impl From<Value> for RequestData {
    fn from(value: Value) -> Self {
        RequestData::Json(value)
    }
}

impl From<String> for RequestData {
    fn from(text: String) -> Self {
        RequestData::Text(text)
    }
}

impl From<&str> for RequestData {
    fn from(text: &str) -> Self {
        RequestData::Text(text.to_string())
    }
}

impl From<Bytes> for RequestData {
    fn from(bytes: Bytes) -> Self {
        RequestData::Binary(bytes)
    }
}

impl From<Vec<u8>> for RequestData {
    fn from(bytes: Vec<u8>) -> Self {
        RequestData::Binary(Bytes::from(bytes))
    }
}

/// Percent-complete callback (0-100)
#[derive(Clone)]
pub struct ProgressHandler(Arc<dyn Fn(u8) + Send + Sync>);

impl ProgressHandler {
    pub fn new(f: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, percent: u8) {
        (self.0)(percent)
    }
}

impl fmt::Debug for ProgressHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressHandler")
    }
}

/// Describes one HTTP call
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Request URL, absolute or relative to `base_url`
    pub url: String,
    /// Base URL joined with relative `url`
    pub base_url: Option<String>,
    /// Method, GET when unset
    pub method: Option<HttpMethod>,
    /// Request body
    pub data: Option<RequestData>,
    /// Query parameters
    pub params: Option<Params>,
    /// Request headers
    pub headers: Headers,
    /// Request timeout
    pub timeout: Option<Duration>,
    /// Expected body format
    pub response_type: Option<ResponseType>,
    /// Send and store credentials (cookies)
    pub with_credentials: Option<bool>,
    /// Cancellation signal
    pub signal: Option<AbortSignal>,
    /// Additional attempts after the first failure
    pub retry_count: Option<u32>,
    /// Base delay between attempts
    pub retry_delay: Option<Duration>,
    /// Upload progress in percent
    pub on_upload_progress: Option<ProgressHandler>,
    /// Download progress in percent
    pub on_download_progress: Option<ProgressHandler>,
}

impl RequestConfig {
    /// Create a config for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Defaults used by [`crate::HttpClient`]: 30s timeout, JSON content type
    pub fn client_defaults() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            ..Self::default()
        }
        .header(CONTENT_TYPE, APPLICATION_JSON)
    }

    /// Overlay `overrides` on `self`
    ///
    /// Headers merge key by key, ignoring case; every other set field of `overrides` wins.
    pub fn merge(&self, overrides: &RequestConfig) -> RequestConfig {
        let mut headers = self.headers.clone();
        override_headers(&mut headers, &overrides.headers);

        RequestConfig {
            url: if overrides.url.is_empty() {
                self.url.clone()
            } else {
                overrides.url.clone()
            },
            base_url: overrides.base_url.clone().or_else(|| self.base_url.clone()),
            method: overrides.method.or(self.method),
            data: overrides.data.clone().or_else(|| self.data.clone()),
            params: overrides.params.clone().or_else(|| self.params.clone()),
            headers,
            timeout: overrides.timeout.or(self.timeout),
            response_type: overrides.response_type.or(self.response_type),
            with_credentials: overrides.with_credentials.or(self.with_credentials),
            signal: overrides.signal.clone().or_else(|| self.signal.clone()),
            retry_count: overrides.retry_count.or(self.retry_count),
            retry_delay: overrides.retry_delay.or(self.retry_delay),
            on_upload_progress: overrides
                .on_upload_progress
                .clone()
                .or_else(|| self.on_upload_progress.clone()),
            on_download_progress: overrides
                .on_download_progress
                .clone()
                .or_else(|| self.on_download_progress.clone()),
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request body
    pub fn data(mut self, data: impl Into<RequestData>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set a JSON body from any serializable value
    pub fn json<T: Serialize>(mut self, data: &T) -> Result<Self> {
        let value = serde_json::to_value(data)
            .map_err(|e| HttpError::unknown(format!("Failed to serialize body: {}", e)).with_source(e))?;
        self.data = Some(RequestData::Json(value));
        Ok(self)
    }

    /// Add one query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Set a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Retry up to `count` extra times starting at `delay`
    pub fn retry(mut self, count: u32, delay: Duration) -> Self {
        self.retry_count = Some(count);
        self.retry_delay = Some(delay);
        self
    }

    pub fn on_upload_progress(mut self, f: impl Fn(u8) + Send + Sync + 'static) -> Self {
        self.on_upload_progress = Some(ProgressHandler::new(f));
        self
    }

    pub fn on_download_progress(mut self, f: impl Fn(u8) + Send + Sync + 'static) -> Self {
        self.on_download_progress = Some(ProgressHandler::new(f));
        self
    }

    /// Method, GET when unset
    pub fn method_or_default(&self) -> HttpMethod {
        self.method.unwrap_or_default()
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Loggable subset of the config
    pub fn summary(&self) -> Value {
        json!({
            "url": self.url,
            "baseURL": self.base_url,
            "method": self.method_or_default(),
            "params": self.params,
            "headers": self.headers,
            "timeout": self.timeout.map(|t| t.as_millis() as u64),
            "responseType": self.response_type,
            "withCredentials": self.with_credentials,
            "retryCount": self.retry_count,
        })
    }
}

/// Upload progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadProgress {
    /// Percent complete (0-100)
    pub progress: u8,
    pub total_bytes_sent: u64,
    pub total_bytes_expected_to_send: u64,
}

impl UploadProgress {
    pub fn new(sent: u64, expected: u64) -> Self {
        Self {
            progress: percent(sent, expected),
            total_bytes_sent: sent,
            total_bytes_expected_to_send: expected,
        }
    }

    /// Synthesized event for transports without native progress
    pub fn synthesized(progress: u8, bytes: u64) -> Self {
        Self {
            progress,
            total_bytes_sent: bytes,
            total_bytes_expected_to_send: bytes,
        }
    }
}

/// Download progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadProgress {
    /// Percent complete (0-100)
    pub progress: u8,
    pub total_bytes_written: u64,
    pub total_bytes_expected_to_write: u64,
}

impl DownloadProgress {
    pub fn new(written: u64, expected: u64) -> Self {
        Self {
            progress: percent(written, expected),
            total_bytes_written: written,
            total_bytes_expected_to_write: expected,
        }
    }

    /// Synthesized event for transports without native progress
    pub fn synthesized(progress: u8, bytes: u64) -> Self {
        Self {
            progress,
            total_bytes_written: bytes,
            total_bytes_expected_to_write: bytes,
        }
    }
}

pub type UploadProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;
pub type DownloadProgressFn = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// Rounded percentage, 100 for an empty payload
fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (done.min(total) as f64 / total as f64 * 100.0).round();
    pct as u8
}

/// File upload description
#[derive(Debug, Clone, Default)]
pub struct UploadConfig {
    /// URL, headers, timeout, signal; `data` and `method` are ignored
    pub request: RequestConfig,
    /// Local file to send
    pub file_path: PathBuf,
    /// Multipart field name, "file" when unset
    pub name: Option<String>,
    /// Extra multipart fields
    pub form_data: Params,
}

impl UploadConfig {
    pub fn new(url: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            request: RequestConfig::new(url),
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.form_data.insert(key.into(), value.into());
        self
    }

    pub fn field_name(&self) -> &str {
        self.name.as_deref().unwrap_or("file")
    }

    /// File name component of `file_path`
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string())
    }
}

/// File download description
#[derive(Debug, Clone, Default)]
pub struct DownloadConfig {
    /// URL, headers, timeout, signal; `data`, `method` and `response_type` are ignored
    pub request: RequestConfig,
    /// Where to store the body; kept in memory when unset
    pub file_path: Option<PathBuf>,
}

impl DownloadConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            request: RequestConfig::new(url),
            file_path: None,
        }
    }

    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_headers_key_wise() {
        let defaults = RequestConfig::client_defaults().header("x-app", "ui");
        let call = RequestConfig::new("/users")
            .header("x-app", "admin")
            .header("authorization", "Bearer t");

        let merged = defaults.merge(&call);
        assert_eq!(merged.url, "/users");
        assert_eq!(merged.headers.get("x-app").map(String::as_str), Some("admin"));
        assert_eq!(merged.header_value("content-type"), Some(APPLICATION_JSON));
        assert_eq!(merged.header_value("Authorization"), Some("Bearer t"));
        assert_eq!(merged.timeout, Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn test_merge_headers_ignore_case() {
        let defaults = RequestConfig::client_defaults();
        let call = RequestConfig::new("/form")
            .header("content-type", "application/x-www-form-urlencoded");

        let merged = defaults.merge(&call);
        assert_eq!(merged.headers.len(), 1);
        assert_eq!(
            merged.headers.get("content-type").map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );
        assert!(!merged.headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn test_merge_override_wins() {
        let defaults = RequestConfig::default()
            .base_url("https://a.example")
            .timeout(Duration::from_secs(5));
        let call = RequestConfig::new("/x").timeout(Duration::from_secs(1));

        let merged = defaults.merge(&call);
        assert_eq!(merged.timeout, Some(Duration::from_secs(1)));
        assert_eq!(merged.base_url.as_deref(), Some("https://a.example"));
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!("TRACE".parse::<HttpMethod>().is_err());
        assert!(HttpMethod::Put.has_body());
        assert!(!HttpMethod::Delete.has_body());
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(UploadProgress::new(50, 200).progress, 25);
        assert_eq!(DownloadProgress::new(2, 3).progress, 67);
        assert_eq!(DownloadProgress::new(0, 0).progress, 100);
    }

    #[test]
    fn test_upload_names() {
        let upload = UploadConfig::new("/up", "/tmp/photos/cat.png");
        assert_eq!(upload.field_name(), "file");
        assert_eq!(upload.file_name(), "cat.png");
        assert_eq!(upload.name("avatar").field_name(), "avatar");
    }
}
