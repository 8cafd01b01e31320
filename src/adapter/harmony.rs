// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HarmonyOS adapter
//!
//! Drives the native `@ohos.net.http` module through [`OhosHttpModule`]. One
//! native request object is created per call and destroyed when the call
//! ends, whether it completed, failed or was aborted.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use super::base::{build_url, check_status, merge_headers, mime_type_for, parse_headers, status_text, SerializedBody};
use super::fetch::{read_file, with_abort, write_file};
use super::{AdapterKind, HttpAdapter};
use crate::error::{HttpError, Result, TransportError};
use crate::http::headers::{APPLICATION_JSON, CONTENT_TYPE};
use crate::http::{
    DownloadConfig, DownloadProgress, DownloadProgressFn, Headers, HttpMethod, HttpResponse,
    RequestConfig, RequestData, ResponseData, ResponseType, UploadConfig, UploadProgress,
    UploadProgressFn,
};

/// Native read and connect timeout when the request sets none
pub const DEFAULT_NATIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Body format the native module should deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OhosDataType {
    String,
    ArrayBuffer,
}

/// Options passed to the native `request`
#[derive(Debug, Clone)]
pub struct OhosRequestOptions {
    pub method: HttpMethod,
    pub header: Headers,
    pub extra_data: Option<SerializedBody>,
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    pub expect_data_type: OhosDataType,
}

/// Native response body
#[derive(Debug, Clone, PartialEq)]
pub enum OhosBody {
    Text(String),
    ArrayBuffer(Bytes),
}

/// Native response
#[derive(Debug, Clone)]
pub struct OhosHttpResponse {
    pub result: OhosBody,
    pub response_code: u16,
    pub header: Headers,
}

/// Native error callback payload
#[derive(Error, Debug, Clone)]
#[error("{message} (code {code})")]
pub struct OhosError {
    pub code: i32,
    pub message: String,
}

pub type OhosResult = std::result::Result<OhosHttpResponse, OhosError>;

/// One native request object
#[async_trait]
pub trait OhosHttpRequest: Send + Sync {
    async fn request(&self, url: &str, options: OhosRequestOptions) -> OhosResult;

    /// Release the native object, cancelling any running request
    fn destroy(&self);
}

/// The native HTTP module
pub trait OhosHttpModule: Send + Sync {
    fn create_http(&self) -> Box<dyn OhosHttpRequest>;
}

/// Destroys the native request when the call ends
struct NativeRequest(Box<dyn OhosHttpRequest>);

impl Drop for NativeRequest {
    fn drop(&mut self) {
        trace!("Destroying native request");
        self.0.destroy();
    }
}

/// Adapter for HarmonyOS
pub struct HarmonyAdapter {
    module: Option<Arc<dyn OhosHttpModule>>,
}

impl HarmonyAdapter {
    pub fn new(module: Option<Arc<dyn OhosHttpModule>>) -> Self {
        Self { module }
    }

    fn module(&self, config: &RequestConfig) -> Result<&Arc<dyn OhosHttpModule>> {
        self.module.as_ref().ok_or_else(|| {
            HttpError::unknown("HarmonyOS HTTP module not available").with_config(config.clone())
        })
    }

    /// Run one native request; `operation` names it in status errors
    async fn send(
        &self,
        config: &RequestConfig,
        options: OhosRequestOptions,
        operation: &str,
    ) -> Result<HttpResponse> {
        let module = self.module(config)?;
        let url = build_url(config);

        debug!(%url, method = %options.method, "Native HarmonyOS request");

        let native = NativeRequest(module.create_http());
        let outcome = with_abort(config, async {
            native
                .0
                .request(&url, options)
                .await
                .map_err(|e| classify_error(e, config))
        })
        .await;
        drop(native);

        let native = outcome?;
        let data = match native.result {
            OhosBody::Text(text) => ResponseData::from_text(text),
            OhosBody::ArrayBuffer(bytes) => ResponseData::Binary(bytes),
        };

        let response = HttpResponse::new(
            data,
            native.response_code,
            status_text(native.response_code),
            parse_headers(native.header),
            config.clone(),
        );
        check_status(operation, response)
    }
}

fn native_timeout(config: &RequestConfig) -> Duration {
    config.timeout.unwrap_or(DEFAULT_NATIVE_TIMEOUT)
}

/// JSON bodies are stringified, anything else is handed over unchanged
fn extra_data(data: Option<&RequestData>, content_type: Option<&str>) -> Option<SerializedBody> {
    let is_json = content_type.map_or(false, |ct| ct.contains(APPLICATION_JSON));
    data.map(|data| match data {
        RequestData::Json(value) if is_json => SerializedBody::Text(value.to_string()),
        RequestData::Json(value) => SerializedBody::Structured(value.clone()),
        RequestData::Text(text) => SerializedBody::Text(text.clone()),
        RequestData::Binary(bytes) => SerializedBody::Binary(bytes.clone()),
    })
}

fn classify_error(err: OhosError, config: &RequestConfig) -> HttpError {
    let classified = if err.message.contains("timeout") {
        HttpError::timeout("Request timeout")
    } else if err.message.contains("network") || err.message.contains("connect") {
        HttpError::network("Network error")
    } else if err.message.is_empty() {
        HttpError::unknown("Unknown error")
    } else {
        HttpError::unknown(err.message.clone())
    };
    classified
        .with_source(TransportError::Native(err.to_string()))
        .with_config(config.clone())
}

/// Hand-built multipart body for the native request
fn multipart_body(config: &UploadConfig, content: &[u8], boundary: &str) -> Bytes {
    let mut body = BytesMut::new();

    for (key, value) in &config.form_data {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        body.put_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, key, value
            )
            .as_bytes(),
        );
    }

    let file_name = config.file_name();
    body.put_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            boundary,
            config.field_name(),
            file_name,
            mime_type_for(&file_name)
        )
        .as_bytes(),
    );
    body.put_slice(content);
    body.put_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    body.freeze()
}

fn boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("----UnihttpFormBoundary{:x}", nanos)
}

#[async_trait]
impl HttpAdapter for HarmonyAdapter {
    fn name(&self) -> &'static str {
        "harmony"
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Full
    }

    async fn request(&self, config: &RequestConfig) -> Result<HttpResponse> {
        let mut defaults = Headers::new();
        defaults.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
        let header = merge_headers(&defaults, &config.headers);

        let method = config.method_or_default();
        let extra_data = if method.has_body() {
            let content_type = header
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE))
                .map(|(_, v)| v.as_str());
            extra_data(config.data.as_ref(), content_type)
        } else {
            None
        };

        let options = OhosRequestOptions {
            method,
            header,
            extra_data,
            read_timeout: native_timeout(config),
            connect_timeout: native_timeout(config),
            expect_data_type: match config.response_type {
                Some(ResponseType::ArrayBuffer) => OhosDataType::ArrayBuffer,
                _ => OhosDataType::String,
            },
        };

        self.send(config, options, "Request").await
    }

    async fn upload(
        &self,
        config: &UploadConfig,
        on_progress: Option<UploadProgressFn>,
    ) -> Result<HttpResponse> {
        let request = &config.request;
        self.module(request)?;

        if let Some(cb) = on_progress.as_ref() {
            cb(UploadProgress::synthesized(0, 0));
        }

        let content = read_file(&config.file_path)
            .await
            .map_err(|e| e.or_config(request))?;
        let boundary = boundary();
        let body = multipart_body(config, &content, &boundary);
        let size = body.len() as u64;

        let mut header: Headers = request
            .headers
            .iter()
            .filter(|(k, _)| !k.eq_ignore_ascii_case(CONTENT_TYPE))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        header.insert(
            CONTENT_TYPE.to_string(),
            format!("multipart/form-data; boundary={}", boundary),
        );

        let options = OhosRequestOptions {
            method: HttpMethod::Post,
            header,
            extra_data: Some(SerializedBody::Binary(body)),
            read_timeout: native_timeout(request),
            connect_timeout: native_timeout(request),
            expect_data_type: OhosDataType::String,
        };

        let response = self.send(request, options, "Upload").await?;

        if let Some(cb) = on_progress.as_ref() {
            cb(UploadProgress::synthesized(100, size));
        }
        Ok(response)
    }

    async fn download(
        &self,
        config: &DownloadConfig,
        on_progress: Option<DownloadProgressFn>,
    ) -> Result<HttpResponse> {
        let request = &config.request;
        self.module(request)?;

        if let Some(cb) = on_progress.as_ref() {
            cb(DownloadProgress::synthesized(0, 0));
        }

        let options = OhosRequestOptions {
            method: HttpMethod::Get,
            header: request.headers.clone(),
            extra_data: None,
            read_timeout: native_timeout(request),
            connect_timeout: native_timeout(request),
            expect_data_type: OhosDataType::ArrayBuffer,
        };

        let response = self.send(request, options, "Download").await?;

        let size = match &response.data {
            ResponseData::Binary(bytes) => bytes.len() as u64,
            _ => 0,
        };
        if let Some(cb) = on_progress.as_ref() {
            cb(DownloadProgress::synthesized(100, size));
        }

        match (&config.file_path, &response.data) {
            (Some(path), ResponseData::Binary(bytes)) => {
                write_file(path, bytes).await.map_err(|e| e.or_config(request))?;
                let path = path.clone();
                Ok(response.map(|_| ResponseData::File(path)))
            }
            _ => Ok(response),
        }
    }
}
