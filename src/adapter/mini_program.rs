// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Mini-program adapter
//!
//! Drives the host's request, uploadFile and downloadFile APIs through a
//! [`MiniProgramBridge`]. Plain requests go through a bounded queue: at most
//! [`MAX_CONCURRENT_REQUESTS`] run at once and the rest wait in FIFO order.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, trace};

use super::base::{build_url, check_status, merge_headers, parse_headers, status_text};
use super::fetch::with_abort;
use super::{AdapterKind, HttpAdapter};
use crate::error::{HttpError, Result, TransportError};
use crate::http::headers::{APPLICATION_JSON, CONTENT_TYPE};
use crate::http::{
    DownloadConfig, DownloadProgressFn, Headers, HttpMethod, HttpResponse, Params, RequestConfig,
    RequestData, ResponseData, ResponseType, UploadConfig, UploadProgressFn,
};

/// Native requests allowed in flight per adapter
pub const MAX_CONCURRENT_REQUESTS: usize = 10;

/// Options for the host `request` API
#[derive(Debug, Clone)]
pub struct MiniRequestOptions {
    pub url: String,
    pub method: HttpMethod,
    pub data: Option<RequestData>,
    pub header: Headers,
    pub timeout: Option<Duration>,
    /// `ArrayBuffer` or `Text`
    pub response_type: ResponseType,
    /// Ask the host to parse the body as JSON
    pub parse_json: bool,
}

/// Result of the host `request` API
#[derive(Debug, Clone)]
pub struct MiniRequestResponse {
    pub data: ResponseData,
    pub status_code: u16,
    pub header: Headers,
}

/// Options for the host `uploadFile` API
#[derive(Debug, Clone)]
pub struct MiniUploadOptions {
    pub url: String,
    pub file_path: PathBuf,
    pub name: String,
    pub header: Headers,
    pub form_data: Params,
    pub timeout: Option<Duration>,
}

/// Result of the host `uploadFile` API; the body is always text
#[derive(Debug, Clone)]
pub struct MiniUploadResponse {
    pub data: String,
    pub status_code: u16,
    pub header: Headers,
}

/// Options for the host `downloadFile` API
#[derive(Debug, Clone)]
pub struct MiniDownloadOptions {
    pub url: String,
    pub header: Headers,
    pub file_path: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

/// Result of the host `downloadFile` API
#[derive(Debug, Clone)]
pub struct MiniDownloadResponse {
    pub temp_file_path: PathBuf,
    pub file_path: Option<PathBuf>,
    pub status_code: u16,
    pub header: Headers,
}

/// Failure callback payload
#[derive(Error, Debug, Clone)]
#[error("{err_msg}")]
pub struct MiniFailure {
    pub err_msg: String,
}

impl MiniFailure {
    pub fn new(err_msg: impl Into<String>) -> Self {
        Self {
            err_msg: err_msg.into(),
        }
    }
}

/// Host mini-program networking API
///
/// Dropping a returned future must abort the underlying native task.
#[async_trait]
pub trait MiniProgramBridge: Send + Sync {
    async fn request(&self, options: MiniRequestOptions) -> std::result::Result<MiniRequestResponse, MiniFailure>;

    async fn upload_file(
        &self,
        options: MiniUploadOptions,
        on_progress: Option<UploadProgressFn>,
    ) -> std::result::Result<MiniUploadResponse, MiniFailure>;

    async fn download_file(
        &self,
        options: MiniDownloadOptions,
        on_progress: Option<DownloadProgressFn>,
    ) -> std::result::Result<MiniDownloadResponse, MiniFailure>;
}

/// Adapter for mini-program hosts
pub struct MiniProgramAdapter {
    bridge: Option<Arc<dyn MiniProgramBridge>>,
    slots: Semaphore,
    active: AtomicUsize,
    queued: AtomicUsize,
}

impl MiniProgramAdapter {
    pub fn new(bridge: Option<Arc<dyn MiniProgramBridge>>) -> Self {
        Self {
            bridge,
            slots: Semaphore::new(MAX_CONCURRENT_REQUESTS),
            active: AtomicUsize::new(0),
            queued: AtomicUsize::new(0),
        }
    }

    /// Requests currently running natively
    pub fn active_requests(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Requests waiting for a slot
    pub fn queued_requests(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    fn bridge(&self, config: &RequestConfig) -> Result<&Arc<dyn MiniProgramBridge>> {
        self.bridge.as_ref().ok_or_else(|| {
            HttpError::unknown("Mini-program bridge not available").with_config(config.clone())
        })
    }

    /// Wait for a free slot, FIFO behind earlier waiters
    async fn acquire_slot(&self) -> Result<SemaphorePermit<'_>> {
        if let Ok(permit) = self.slots.try_acquire() {
            return Ok(permit);
        }

        let queued = self.queued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(queued, "Mini-program request queued");
        let _dequeue = CounterGuard(&self.queued);

        self.slots
            .acquire()
            .await
            .map_err(|_| HttpError::unknown("Request queue closed"))
    }

    async fn execute(&self, bridge: &Arc<dyn MiniProgramBridge>, config: &RequestConfig) -> Result<HttpResponse> {
        self.active.fetch_add(1, Ordering::SeqCst);
        let _release = CounterGuard(&self.active);

        let mut defaults = Headers::new();
        defaults.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());

        let options = MiniRequestOptions {
            url: build_url(config),
            method: config.method_or_default(),
            data: config.data.clone(),
            header: merge_headers(&defaults, &config.headers),
            timeout: config.timeout,
            response_type: match config.response_type {
                Some(ResponseType::ArrayBuffer) => ResponseType::ArrayBuffer,
                _ => ResponseType::Text,
            },
            parse_json: config.response_type == Some(ResponseType::Json),
        };

        trace!(url = %options.url, method = %options.method, "Native request");
        let native = bridge.request(options).await.map_err(|f| classify_failure(f, config))?;

        if config.signal.as_ref().map_or(false, |s| s.aborted()) {
            return Err(HttpError::cancelled("Request cancelled").with_config(config.clone()));
        }

        let response = HttpResponse::new(
            native.data,
            native.status_code,
            status_text(native.status_code),
            parse_headers(native.header),
            config.clone(),
        );
        check_status("Request", response)
    }
}

/// Decrements the wrapped counter on drop
struct CounterGuard<'a>(&'a AtomicUsize);

impl Drop for CounterGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Classify a host failure from its `errMsg`
fn classify_failure(failure: MiniFailure, config: &RequestConfig) -> HttpError {
    let msg = failure.err_msg.as_str();
    let err = if msg.contains("timeout") {
        HttpError::timeout("Request timeout")
    } else if msg.contains("abort") {
        HttpError::cancelled("Request cancelled")
    } else if msg.contains("fail") {
        HttpError::network("Network error")
    } else {
        HttpError::unknown("Unknown error")
    };
    err.with_source(TransportError::Native(failure.err_msg))
        .with_config(config.clone())
}

/// Upload and download failures are network errors unless the host reports
/// a timeout or an abort
fn transfer_failure(failure: MiniFailure, fallback: &str, config: &RequestConfig) -> HttpError {
    let msg = failure.err_msg.as_str();
    if msg.contains("timeout") || msg.contains("abort") {
        return classify_failure(failure, config);
    }
    let message = if msg.is_empty() {
        fallback.to_string()
    } else {
        failure.err_msg.clone()
    };
    HttpError::network(message)
        .with_source(TransportError::Native(failure.err_msg))
        .with_config(config.clone())
}

#[async_trait]
impl HttpAdapter for MiniProgramAdapter {
    fn name(&self) -> &'static str {
        "mini-program"
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Full
    }

    async fn request(&self, config: &RequestConfig) -> Result<HttpResponse> {
        let bridge = self.bridge(config)?;

        // Aborting while queued gives up the place in line
        with_abort(config, async {
            let _permit = self.acquire_slot().await.map_err(|e| e.or_config(config))?;
            self.execute(bridge, config).await
        })
        .await
    }

    async fn upload(
        &self,
        config: &UploadConfig,
        on_progress: Option<UploadProgressFn>,
    ) -> Result<HttpResponse> {
        let request = &config.request;
        let bridge = self.bridge(request)?;

        let options = MiniUploadOptions {
            url: build_url(request),
            file_path: config.file_path.clone(),
            name: config.field_name().to_string(),
            header: request.headers.clone(),
            form_data: config.form_data.clone(),
            timeout: request.timeout,
        };

        debug!(url = %options.url, file = %options.file_path.display(), "Native upload");
        let native = with_abort(request, async {
            bridge
                .upload_file(options, on_progress)
                .await
                .map_err(|f| transfer_failure(f, "Upload failed", request))
        })
        .await?;

        let response = HttpResponse::new(
            ResponseData::from_text(native.data),
            native.status_code,
            status_text(native.status_code),
            parse_headers(native.header),
            request.clone(),
        );
        check_status("Upload", response)
    }

    async fn download(
        &self,
        config: &DownloadConfig,
        on_progress: Option<DownloadProgressFn>,
    ) -> Result<HttpResponse> {
        let request = &config.request;
        let bridge = self.bridge(request)?;

        let options = MiniDownloadOptions {
            url: build_url(request),
            header: request.headers.clone(),
            file_path: config.file_path.clone(),
            timeout: request.timeout,
        };

        debug!(url = %options.url, "Native download");
        let native = with_abort(request, async {
            bridge
                .download_file(options, on_progress)
                .await
                .map_err(|f| transfer_failure(f, "Download failed", request))
        })
        .await?;

        let path = native.file_path.unwrap_or(native.temp_file_path);
        let response = HttpResponse::new(
            ResponseData::File(path),
            native.status_code,
            status_text(native.status_code),
            parse_headers(native.header),
            request.clone(),
        );
        check_status("Download", response)
    }
}
