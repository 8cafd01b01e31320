// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP response types

use std::path::PathBuf;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::config::{Headers, RequestConfig};
use crate::error::{HttpError, Result};

/// Untyped body produced by an adapter
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// Parsed JSON
    Json(Value),
    /// Text body
    Text(String),
    /// Raw bytes (`arraybuffer` response type)
    Binary(Bytes),
    /// Body stored on disk by a download
    File(PathBuf),
}

impl ResponseData {
    /// Parse text as JSON, keeping the text when it is not JSON
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => ResponseData::Json(value),
            Err(_) => ResponseData::Text(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseData::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Convert into a typed value
    ///
    /// Text is tried as JSON first and then as a JSON string; a file becomes
    /// `{"filePath": ...}`.
    pub fn into_typed<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        match self {
            ResponseData::Json(value) => serde_json::from_value(value),
            ResponseData::Text(text) => match serde_json::from_str(&text) {
                Ok(value) => Ok(value),
                Err(_) => serde_json::from_value(Value::String(text)),
            },
            ResponseData::Binary(bytes) => serde_json::from_slice(&bytes),
            ResponseData::File(path) => serde_json::from_value(json!({ "filePath": path })),
        }
    }
}

/// HTTP response representation
#[derive(Debug, Clone)]
pub struct HttpResponse<T = ResponseData> {
    /// Response body
    pub data: T,
    /// Status code
    pub status: u16,
    /// Status text
    pub status_text: String,
    /// Headers with lower-case keys
    pub headers: Headers,
    /// Config that produced the response
    pub config: RequestConfig,
}

impl<T> HttpResponse<T> {
    /// Create a new response
    pub fn new(
        data: T,
        status: u16,
        status_text: impl Into<String>,
        headers: Headers,
        config: RequestConfig,
    ) -> Self {
        Self {
            data,
            status,
            status_text: status_text.into(),
            headers,
            config,
        }
    }

    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Get content type
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Replace the body, keeping status and headers
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> HttpResponse<U> {
        HttpResponse {
            data: f(self.data),
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            config: self.config,
        }
    }
}

impl HttpResponse<ResponseData> {
    /// Deserialize the body into `U`; failure is `INVALID_RESPONSE`
    pub fn into_typed<U: DeserializeOwned>(self) -> Result<HttpResponse<U>> {
        let HttpResponse {
            data,
            status,
            status_text,
            headers,
            config,
        } = self;

        match data.into_typed::<U>() {
            Ok(data) => Ok(HttpResponse {
                data,
                status,
                status_text,
                headers,
                config,
            }),
            Err(e) => Err(HttpError::from(e).with_config(config)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u32,
    }

    fn response(data: ResponseData) -> HttpResponse {
        let mut headers = Headers::new();
        headers.insert("content-type".into(), "application/json".into());
        HttpResponse::new(data, 200, "OK", headers, RequestConfig::new("/u"))
    }

    #[test]
    fn test_typed_json() {
        let resp = response(ResponseData::Json(json!({"id": 1})));
        assert!(resp.is_success());
        assert_eq!(resp.header("Content-Type"), Some("application/json"));

        let typed = resp.into_typed::<User>().unwrap();
        assert_eq!(typed.data, User { id: 1 });
    }

    #[test]
    fn test_typed_text() {
        let text: String = ResponseData::Text("hello".into()).into_typed().unwrap();
        assert_eq!(text, "hello");

        let user: User = ResponseData::Text("{\"id\":7}".into()).into_typed().unwrap();
        assert_eq!(user.id, 7);
    }

    #[test]
    fn test_invalid_response() {
        let err = response(ResponseData::Text("not json".into()))
            .into_typed::<User>()
            .unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::InvalidResponse);
        assert_eq!(err.url(), Some("/u"));
    }

    #[test]
    fn test_from_text() {
        assert_eq!(
            ResponseData::from_text("[1,2]".into()),
            ResponseData::Json(json!([1, 2]))
        );
        assert_eq!(
            ResponseData::from_text("plain".into()),
            ResponseData::Text("plain".into())
        );
    }
}
