// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Helpers shared by every adapter

use std::collections::HashMap;
use std::path::Path;

use bytes::Bytes;
use lazy_static::lazy_static;
use serde_json::Value;

use crate::error::{ErrorCode, HttpError, Result};
use crate::http::headers::{APPLICATION_JSON, FORM_URLENCODED, OCTET_STREAM};
use crate::http::{Headers, HttpResponse, Params, RequestConfig, RequestData, ResponseData, ResponseType};

lazy_static! {
    static ref STATUS_TEXTS: HashMap<u16, &'static str> = {
        let mut m = HashMap::new();
        m.insert(200, "OK");
        m.insert(201, "Created");
        m.insert(204, "No Content");
        m.insert(301, "Moved Permanently");
        m.insert(302, "Found");
        m.insert(304, "Not Modified");
        m.insert(400, "Bad Request");
        m.insert(401, "Unauthorized");
        m.insert(403, "Forbidden");
        m.insert(404, "Not Found");
        m.insert(405, "Method Not Allowed");
        m.insert(408, "Request Timeout");
        m.insert(500, "Internal Server Error");
        m.insert(502, "Bad Gateway");
        m.insert(503, "Service Unavailable");
        m.insert(504, "Gateway Timeout");
        m
    };

    static ref MIME_TYPES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("jpg", "image/jpeg");
        m.insert("jpeg", "image/jpeg");
        m.insert("png", "image/png");
        m.insert("gif", "image/gif");
        m.insert("webp", "image/webp");
        m.insert("pdf", "application/pdf");
        m.insert("doc", "application/msword");
        m.insert(
            "docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        );
        m.insert("xls", "application/vnd.ms-excel");
        m.insert(
            "xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        );
        m.insert("txt", "text/plain");
        m.insert("json", "application/json");
        m.insert("xml", "application/xml");
        m.insert("zip", "application/zip");
        m.insert("mp3", "audio/mpeg");
        m.insert("mp4", "video/mp4");
        m
    };
}

/// Resolve the final request URL
///
/// Relative urls are joined to `base_url` with exactly one slash; absolute
/// `http://` and `https://` urls ignore it. Non-empty `params` are appended
/// as a query string.
pub fn build_url(config: &RequestConfig) -> String {
    let mut url = config.url.clone();

    if let Some(base) = config.base_url.as_deref() {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            url = format!(
                "{}/{}",
                base.strip_suffix('/').unwrap_or(base),
                url.strip_prefix('/').unwrap_or(&url)
            );
        }
    }

    if let Some(params) = config.params.as_ref().filter(|p| !p.is_empty()) {
        let query = build_query_string(params);
        if !query.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }
    }

    url
}

/// Encode params as `k=v&k=v`
///
/// Arrays repeat the key per item; nulls are skipped.
pub fn build_query_string(params: &Params) -> String {
    let mut parts = Vec::new();

    for (key, value) in params {
        match value {
            Value::Null => continue,
            Value::Array(items) => {
                for item in items.iter().filter(|v| !v.is_null()) {
                    parts.push(format!("{}={}", encode_component(key), encode_component(&value_to_string(item))));
                }
            }
            other => {
                parts.push(format!("{}={}", encode_component(key), encode_component(&value_to_string(other))));
            }
        }
    }

    parts.join("&")
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
fn encode_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '!' | '~' | '*' | '\'' | '('
            | ')' => result.push(c),
            _ => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    result.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    result
}

/// Overlay `custom` on `defaults`
///
/// A custom header replaces a default one whose name matches
/// case-insensitively; the custom spelling is kept.
pub fn merge_headers(defaults: &Headers, custom: &Headers) -> Headers {
    let mut merged: Headers = defaults
        .iter()
        .filter(|(k, _)| !custom.keys().any(|c| c.eq_ignore_ascii_case(k)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    merged.extend(custom.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Body ready for a transport
#[derive(Debug, Clone, PartialEq)]
pub enum SerializedBody {
    Text(String),
    Binary(Bytes),
    /// Structured data the transport encodes itself
    Structured(Value),
}

impl SerializedBody {
    pub fn into_bytes(self) -> Bytes {
        match self {
            SerializedBody::Text(text) => Bytes::from(text),
            SerializedBody::Binary(bytes) => bytes,
            SerializedBody::Structured(value) => Bytes::from(value.to_string()),
        }
    }
}

/// Serialize a body for `content_type`
///
/// JSON content types stringify, form-encoded content types URL-encode
/// objects, anything else passes through.
pub fn serialize_data(data: Option<&RequestData>, content_type: Option<&str>) -> Option<SerializedBody> {
    let data = data?;
    let content_type = content_type.unwrap_or_default();

    let body = match data {
        RequestData::Json(value) if content_type.contains(APPLICATION_JSON) => {
            SerializedBody::Text(value.to_string())
        }
        RequestData::Json(Value::Object(map)) if content_type.contains(FORM_URLENCODED) => {
            SerializedBody::Text(build_query_string(map))
        }
        RequestData::Json(value) => SerializedBody::Structured(value.clone()),
        RequestData::Text(text) => SerializedBody::Text(text.clone()),
        RequestData::Binary(bytes) => SerializedBody::Binary(bytes.clone()),
    };
    Some(body)
}

/// Response headers as delivered by a native API
#[derive(Debug, Clone)]
pub enum RawHeaders {
    /// CRLF-delimited `name: value` lines
    Text(String),
    Map(Headers),
}

impl From<&str> for RawHeaders {
    fn from(raw: &str) -> Self {
        RawHeaders::Text(raw.to_string())
    }
}

impl From<Headers> for RawHeaders {
    fn from(map: Headers) -> Self {
        RawHeaders::Map(map)
    }
}

impl From<HashMap<String, String>> for RawHeaders {
    fn from(map: HashMap<String, String>) -> Self {
        RawHeaders::Map(map.into_iter().collect())
    }
}

/// Normalize response headers to lower-case keys
pub fn parse_headers(raw: impl Into<RawHeaders>) -> Headers {
    match raw.into() {
        RawHeaders::Text(text) => text
            .split("\r\n")
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                Some((key.to_ascii_lowercase(), value.trim().to_string()))
            })
            .collect(),
        RawHeaders::Map(map) => map
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect(),
    }
}

/// Reason phrase for `status`, `"Unknown"` when not tabled
pub fn status_text(status: u16) -> &'static str {
    STATUS_TEXTS.get(&status).copied().unwrap_or("Unknown")
}

/// `SERVER_ERROR` for 5xx, `CLIENT_ERROR` for 4xx
pub fn error_code_for_status(status: u16) -> Option<ErrorCode> {
    ErrorCode::from_status(status)
}

/// Guess a MIME type from a file name's extension
pub fn mime_type_for(file_name: impl AsRef<Path>) -> &'static str {
    file_name
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| MIME_TYPES.get(ext.as_str()).copied())
        .unwrap_or(OCTET_STREAM)
}

/// Fail with the status-classified error when `status >= 400`
///
/// `operation` prefixes the message, e.g. `Request failed with status 404`.
pub(crate) fn check_status(operation: &str, response: HttpResponse) -> Result<HttpResponse> {
    if error_code_for_status(response.status).is_some() {
        let message = format!("{} failed with status {}", operation, response.status);
        return Err(HttpError::from_status(message, response));
    }
    Ok(response)
}

/// Decode a body the way fetch-style adapters do
///
/// `arraybuffer` keeps bytes, `text` or a non-JSON content type yields text,
/// otherwise JSON with a text fallback.
pub(crate) fn decode_body(body: Bytes, content_type: &str, response_type: Option<ResponseType>) -> ResponseData {
    match response_type {
        Some(ResponseType::ArrayBuffer) => ResponseData::Binary(body),
        Some(ResponseType::Text) => ResponseData::Text(String::from_utf8_lossy(&body).into_owned()),
        _ if !content_type.contains(APPLICATION_JSON) => {
            ResponseData::Text(String::from_utf8_lossy(&body).into_owned())
        }
        _ => match serde_json::from_slice::<Value>(&body) {
            Ok(value) => ResponseData::Json(value),
            Err(_) => ResponseData::Text(String::from_utf8_lossy(&body).into_owned()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_url_joins_base() {
        let config = RequestConfig::new("/users/1").base_url("https://api.example.com/");
        assert_eq!(build_url(&config), "https://api.example.com/users/1");

        let config = RequestConfig::new("users").base_url("https://api.example.com");
        assert_eq!(build_url(&config), "https://api.example.com/users");
    }

    #[test]
    fn test_build_url_absolute_ignores_base() {
        let config = RequestConfig::new("https://other.example/x").base_url("https://api.example.com");
        assert_eq!(build_url(&config), "https://other.example/x");
    }

    #[test]
    fn test_build_url_params() {
        let config = RequestConfig::new("/search?lang=en")
            .param("q", "a b&c")
            .param("tags", json!(["x", "y"]))
            .param("skip", Value::Null);
        assert_eq!(build_url(&config), "/search?lang=en&q=a%20b%26c&tags=x&tags=y");

        let config = RequestConfig::new("/list").param("page", 2).param("all", true);
        assert_eq!(build_url(&config), "/list?all=true&page=2");
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)j"), "a-b_c.d!e~f*g'h(i)j");
        assert_eq!(encode_component("é/?"), "%C3%A9%2F%3F");
    }

    #[test]
    fn test_merge_headers() {
        let mut defaults = Headers::new();
        defaults.insert("Content-Type".into(), APPLICATION_JSON.into());
        defaults.insert("X-Trace".into(), "1".into());
        let mut custom = Headers::new();
        custom.insert("content-type".into(), "text/plain".into());

        let merged = merge_headers(&defaults, &custom);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("content-type").map(String::as_str), Some("text/plain"));
        assert!(!merged.contains_key("Content-Type"));
    }

    #[test]
    fn test_serialize_data() {
        let data = RequestData::Json(json!({"a": 1, "b": "x y"}));

        assert_eq!(
            serialize_data(Some(&data), Some("application/json; charset=utf-8")),
            Some(SerializedBody::Text("{\"a\":1,\"b\":\"x y\"}".into()))
        );
        assert_eq!(
            serialize_data(Some(&data), Some(FORM_URLENCODED)),
            Some(SerializedBody::Text("a=1&b=x%20y".into()))
        );
        assert_eq!(
            serialize_data(Some(&data), None),
            Some(SerializedBody::Structured(json!({"a": 1, "b": "x y"})))
        );
        assert_eq!(serialize_data(None, Some(APPLICATION_JSON)), None);
    }

    #[test]
    fn test_parse_headers() {
        let parsed = parse_headers("Content-Type: application/json\r\nX-Time: 12:30:00\r\n\r\n");
        assert_eq!(parsed.get("content-type").map(String::as_str), Some("application/json"));
        assert_eq!(parsed.get("x-time").map(String::as_str), Some("12:30:00"));
        assert_eq!(parsed.len(), 2);

        let mut map = Headers::new();
        map.insert("ETag".into(), "abc".into());
        assert_eq!(parse_headers(map).get("etag").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_status_helpers() {
        assert_eq!(status_text(404), "Not Found");
        assert_eq!(status_text(418), "Unknown");
        assert_eq!(error_code_for_status(502), Some(ErrorCode::ServerError));
        assert_eq!(error_code_for_status(404), Some(ErrorCode::ClientError));
        assert_eq!(error_code_for_status(304), None);
    }

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for("photo.JPG"), "image/jpeg");
        assert_eq!(mime_type_for("/tmp/report.pdf"), "application/pdf");
        assert_eq!(mime_type_for("blob"), OCTET_STREAM);
    }

    #[test]
    fn test_decode_body() {
        let body = Bytes::from_static(b"{\"id\":1}");
        assert_eq!(
            decode_body(body.clone(), "application/json", None),
            ResponseData::Json(json!({"id": 1}))
        );
        assert_eq!(
            decode_body(body.clone(), "text/plain", None),
            ResponseData::Text("{\"id\":1}".into())
        );
        assert_eq!(
            decode_body(body.clone(), "application/json", Some(ResponseType::ArrayBuffer)),
            ResponseData::Binary(body)
        );
        assert_eq!(
            decode_body(Bytes::from_static(b"oops"), "application/json", None),
            ResponseData::Text("oops".into())
        );
    }

    #[test]
    fn test_check_status() {
        let response = HttpResponse::new(
            ResponseData::Text(String::new()),
            503,
            status_text(503),
            Headers::new(),
            RequestConfig::new("/x"),
        );
        let err = check_status("Request", response).unwrap_err();
        assert_eq!(err.code, ErrorCode::ServerError);
        assert_eq!(err.message, "Request failed with status 503");
    }
}
