// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client implementation

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::{debug, info_span, Instrument};

use super::abort::AbortController;
use super::config::{
    override_headers, DownloadConfig, DownloadProgress, DownloadProgressFn, Headers, HttpMethod, RequestConfig,
    RequestData, UploadConfig, UploadProgress, UploadProgressFn,
};
use super::response::{HttpResponse, ResponseData};
use super::retry::RetryConfig;
use super::DEFAULT_RETRY_DELAY;
use crate::adapter::{supports_download, supports_upload, AdapterContext, HttpAdapter};
use crate::error::{HttpError, Result};
use crate::interceptor::Interceptors;

/// Interceptor-driven client over one platform adapter
///
/// Clones share defaults, adapter and interceptors.
#[derive(Clone)]
pub struct HttpClient {
    defaults: Arc<RwLock<RequestConfig>>,
    adapter: Arc<dyn HttpAdapter>,
    interceptors: Arc<Interceptors>,
}

impl HttpClient {
    /// Client for the detected platform
    pub fn new() -> Self {
        Self::from_context(&AdapterContext::new())
    }

    /// Client using the cached adapter of `context`
    pub fn from_context(context: &AdapterContext) -> Self {
        Self::with_adapter(context.create_adapter(true))
    }

    /// Client over an explicit adapter
    pub fn with_adapter(adapter: Arc<dyn HttpAdapter>) -> Self {
        Self {
            defaults: Arc::new(RwLock::new(RequestConfig::client_defaults())),
            adapter,
            interceptors: Arc::new(Interceptors::default()),
        }
    }

    /// New client sharing this adapter, with `config` merged over these defaults
    ///
    /// Interceptors are not shared.
    pub fn create(&self, config: RequestConfig) -> Self {
        let defaults = self.defaults.read().merge(&config);
        Self {
            defaults: Arc::new(RwLock::new(defaults)),
            adapter: self.adapter.clone(),
            interceptors: Arc::new(Interceptors::default()),
        }
    }

    pub fn adapter(&self) -> &Arc<dyn HttpAdapter> {
        &self.adapter
    }

    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    pub fn create_abort_controller(&self) -> AbortController {
        AbortController::new()
    }

    pub fn set_base_url(&self, base_url: impl Into<String>) {
        self.defaults.write().base_url = Some(base_url.into());
    }

    pub fn base_url(&self) -> Option<String> {
        self.defaults.read().base_url.clone()
    }

    /// Merge `headers` into the default headers
    pub fn set_headers(&self, headers: Headers) {
        override_headers(&mut self.defaults.write().headers, &headers);
    }

    pub fn headers(&self) -> Headers {
        self.defaults.read().headers.clone()
    }

    pub fn set_timeout(&self, timeout: Duration) {
        self.defaults.write().timeout = Some(timeout);
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.defaults.read().timeout
    }

    /// Merge `config` into the defaults
    pub fn set_config(&self, config: RequestConfig) {
        let mut defaults = self.defaults.write();
        *defaults = defaults.merge(&config);
    }

    pub fn config(&self) -> RequestConfig {
        self.defaults.read().clone()
    }

    /// Run one request through interceptors, adapter and retry
    ///
    /// Every failure is handed to the response error handlers before it is
    /// returned.
    pub async fn request(&self, config: RequestConfig) -> Result<HttpResponse> {
        let merged = self.defaults.read().merge(&config);
        let span = info_span!(
            "request",
            method = %merged.method_or_default(),
            url = %merged.url
        );

        async {
            match self.execute(merged.clone()).await {
                Ok(response) => Ok(response),
                Err(err) => {
                    let err = err.or_config(&merged);
                    debug!(code = %err.code, status = ?err.status, "Request failed");
                    self.interceptors.response.notify_error(&err).await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, config: RequestConfig) -> Result<HttpResponse> {
        let config = self.interceptors.request.run(config).await?;

        let retry = RetryConfig::exponential(
            config.retry_count.unwrap_or(0),
            config.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
        );
        let adapter = &self.adapter;
        let response = retry
            .run(config.signal.as_ref(), |_| adapter.request(&config))
            .await?;

        debug!(status = response.status, "Response received");
        self.interceptors.response.run(response).await
    }

    /// Like [`request`](Self::request) with the body decoded into `T`
    pub async fn request_typed<T: DeserializeOwned>(
        &self,
        config: RequestConfig,
    ) -> Result<HttpResponse<T>> {
        self.request(config).await?.into_typed()
    }

    /// Send `method` to `url` with the extra settings in `config`; returns the data
    pub async fn send(
        &self,
        method: HttpMethod,
        url: impl Into<String>,
        data: Option<RequestData>,
        config: RequestConfig,
    ) -> Result<ResponseData> {
        let mut config = config.method(method);
        config.url = url.into();
        if data.is_some() {
            config.data = data;
        }
        Ok(self.request(config).await?.data)
    }

    pub async fn get(&self, url: impl Into<String>) -> Result<ResponseData> {
        self.get_with(url, RequestConfig::default()).await
    }

    /// GET with per-call params, headers, signal or retry settings
    pub async fn get_with(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> Result<ResponseData> {
        self.send(HttpMethod::Get, url, None, config).await
    }

    pub async fn post(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
    ) -> Result<ResponseData> {
        self.post_with(url, data, RequestConfig::default()).await
    }

    pub async fn post_with(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
        config: RequestConfig,
    ) -> Result<ResponseData> {
        self.send(HttpMethod::Post, url, Some(data.into()), config)
            .await
    }

    pub async fn put(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
    ) -> Result<ResponseData> {
        self.put_with(url, data, RequestConfig::default()).await
    }

    pub async fn put_with(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
        config: RequestConfig,
    ) -> Result<ResponseData> {
        self.send(HttpMethod::Put, url, Some(data.into()), config)
            .await
    }

    pub async fn patch(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
    ) -> Result<ResponseData> {
        self.patch_with(url, data, RequestConfig::default()).await
    }

    pub async fn patch_with(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
        config: RequestConfig,
    ) -> Result<ResponseData> {
        self.send(HttpMethod::Patch, url, Some(data.into()), config)
            .await
    }

    pub async fn delete(&self, url: impl Into<String>) -> Result<ResponseData> {
        self.delete_with(url, RequestConfig::default()).await
    }

    pub async fn delete_with(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> Result<ResponseData> {
        self.send(HttpMethod::Delete, url, None, config).await
    }

    /// Upload a file; progress percentages go to `on_upload_progress`
    pub async fn upload(&self, mut config: UploadConfig) -> Result<ResponseData> {
        if !supports_upload(self.adapter.as_ref()) {
            return Err(HttpError::unsupported("Upload").or_config(&config.request));
        }

        config.request = self.transfer_defaults().merge(&config.request);
        let on_progress = config.request.on_upload_progress.clone().map(|handler| {
            Arc::new(move |progress: UploadProgress| handler.call(progress.progress))
                as UploadProgressFn
        });

        debug!(url = %config.request.url, file = %config.file_path.display(), "Uploading");
        let response = self.adapter.upload(&config, on_progress).await?;
        Ok(response.data)
    }

    /// Download a resource; progress percentages go to `on_download_progress`
    pub async fn download(&self, mut config: DownloadConfig) -> Result<ResponseData> {
        if !supports_download(self.adapter.as_ref()) {
            return Err(HttpError::unsupported("Download").or_config(&config.request));
        }

        config.request = self.transfer_defaults().merge(&config.request);
        let on_progress = config.request.on_download_progress.clone().map(|handler| {
            Arc::new(move |progress: DownloadProgress| handler.call(progress.progress))
                as DownloadProgressFn
        });

        debug!(url = %config.request.url, "Downloading");
        let response = self.adapter.download(&config, on_progress).await?;
        Ok(response.data)
    }

    /// Base URL, headers and timeout applied to uploads and downloads
    fn transfer_defaults(&self) -> RequestConfig {
        let defaults = self.defaults.read();
        RequestConfig {
            base_url: defaults.base_url.clone(),
            headers: defaults.headers.clone(),
            timeout: defaults.timeout,
            ..RequestConfig::default()
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("adapter", &self.adapter.name())
            .field("base_url", &self.base_url())
            .field("request_interceptors", &self.interceptors.request.len())
            .field("response_interceptors", &self.interceptors.response.len())
            .finish()
    }
}
