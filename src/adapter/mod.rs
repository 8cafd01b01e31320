// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Platform transport adapters
//!
//! Every platform transport implements [`HttpAdapter`]. Adapters translate a
//! [`RequestConfig`] into the native call and translate native failures into
//! [`HttpError`](crate::HttpError) before returning.

mod base;
mod browser;
mod factory;
mod fetch;
mod harmony;
mod mini_program;
mod react_native;

use async_trait::async_trait;

use crate::error::{HttpError, Result};
use crate::http::{
    AbortSignal, DownloadConfig, DownloadProgressFn, HttpResponse, RequestConfig, UploadConfig,
    UploadProgressFn,
};

pub use base::{
    build_query_string, build_url, error_code_for_status, merge_headers, mime_type_for,
    parse_headers, serialize_data, status_text, RawHeaders, SerializedBody,
};
pub use browser::BrowserAdapter;
pub use factory::{AdapterContext, PlatformDetector};
pub use harmony::{
    HarmonyAdapter, OhosBody, OhosDataType, OhosError, OhosHttpModule, OhosHttpRequest,
    OhosHttpResponse, OhosRequestOptions, OhosResult, DEFAULT_NATIVE_TIMEOUT,
};
pub use mini_program::{
    MiniDownloadOptions, MiniDownloadResponse, MiniFailure, MiniProgramAdapter, MiniProgramBridge,
    MiniRequestOptions, MiniRequestResponse, MiniUploadOptions, MiniUploadResponse,
    MAX_CONCURRENT_REQUESTS,
};
pub use react_native::ReactNativeAdapter;

/// Optional capabilities of an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// `request` only
    Basic,
    /// `request` and `upload`
    Uploadable,
    /// `request` and `download`
    Downloadable,
    /// Everything
    Full,
}

impl AdapterKind {
    pub fn supports_upload(&self) -> bool {
        matches!(self, AdapterKind::Uploadable | AdapterKind::Full)
    }

    pub fn supports_download(&self) -> bool {
        matches!(self, AdapterKind::Downloadable | AdapterKind::Full)
    }
}

/// Uniform transport contract
#[async_trait]
pub trait HttpAdapter: Send + Sync {
    /// Short adapter name, e.g. `browser`
    fn name(&self) -> &'static str;

    /// Capabilities beyond `request`
    fn kind(&self) -> AdapterKind {
        AdapterKind::Basic
    }

    /// Perform one HTTP call
    async fn request(&self, config: &RequestConfig) -> Result<HttpResponse>;

    /// Upload a file as multipart form data
    async fn upload(
        &self,
        config: &UploadConfig,
        _on_progress: Option<UploadProgressFn>,
    ) -> Result<HttpResponse> {
        Err(HttpError::unsupported("Upload").or_config(&config.request))
    }

    /// Download a resource, optionally to `file_path`
    async fn download(
        &self,
        config: &DownloadConfig,
        _on_progress: Option<DownloadProgressFn>,
    ) -> Result<HttpResponse> {
        Err(HttpError::unsupported("Download").or_config(&config.request))
    }

    /// Fire `signal`, terminating every call bound to it
    fn abort(&self, signal: &AbortSignal) {
        signal.trigger();
    }
}

/// Whether `adapter` implements `upload`
pub fn supports_upload(adapter: &dyn HttpAdapter) -> bool {
    adapter.kind().supports_upload()
}

/// Whether `adapter` implements `download`
pub fn supports_download(adapter: &dyn HttpAdapter) -> bool {
    adapter.kind().supports_download()
}
