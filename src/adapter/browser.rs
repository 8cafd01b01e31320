// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Browser (H5) adapter
//!
//! Fetch semantics with byte-level upload and download progress. Cookies are
//! sent and stored only for `with_credentials` requests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::Part;
use reqwest::{Body, Client};
use tracing::debug;

use super::base::mime_type_for;
use super::fetch::{read_file, FetchTransport};
use super::{AdapterKind, HttpAdapter};
use crate::error::{HttpError, Result};
use crate::http::{
    DownloadConfig, DownloadProgress, DownloadProgressFn, HttpResponse, RequestConfig, UploadConfig,
    UploadProgress, UploadProgressFn,
};

/// Size of the chunks fed to the multipart body
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Adapter for browser-like environments
#[derive(Clone)]
pub struct BrowserAdapter {
    transport: FetchTransport,
}

impl BrowserAdapter {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Use a preconfigured reqwest client
    pub fn with_client(client: Client) -> Self {
        Self {
            transport: FetchTransport::with_cookies(client),
        }
    }
}

impl Default for BrowserAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpAdapter for BrowserAdapter {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Full
    }

    async fn request(&self, config: &RequestConfig) -> Result<HttpResponse> {
        self.transport.request(config).await
    }

    async fn upload(
        &self,
        config: &UploadConfig,
        on_progress: Option<UploadProgressFn>,
    ) -> Result<HttpResponse> {
        let content = read_file(&config.file_path)
            .await
            .map_err(|e| e.or_config(&config.request))?;
        let total = content.len() as u64;
        let file_name = config.file_name();

        debug!(file = %config.file_path.display(), bytes = total, "Preparing upload");

        let part = Part::stream_with_length(progress_body(content, on_progress), total)
            .file_name(file_name.clone())
            .mime_str(mime_type_for(&file_name))
            .map_err(|e| {
                HttpError::unknown(format!("Invalid upload part: {}", e))
                    .with_source(e)
                    .with_config(config.request.clone())
            })?;

        self.transport.upload(config, part).await
    }

    async fn download(
        &self,
        config: &DownloadConfig,
        on_progress: Option<DownloadProgressFn>,
    ) -> Result<HttpResponse> {
        self.transport
            .download(config, |received, total| {
                if let (Some(cb), Some(total)) = (on_progress.as_ref(), total) {
                    cb(DownloadProgress::new(received, total));
                }
            })
            .await
    }
}

/// Body that reports progress as reqwest pulls each chunk
fn progress_body(content: Bytes, on_progress: Option<UploadProgressFn>) -> Body {
    let total = content.len() as u64;
    let chunks: Vec<Bytes> = (0..content.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| content.slice(start..(start + UPLOAD_CHUNK_SIZE).min(content.len())))
        .collect();

    let mut sent = 0u64;
    let stream = futures::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        if let Some(cb) = on_progress.as_ref() {
            cb(UploadProgress::new(sent, total));
        }
        Ok::<Bytes, std::io::Error>(chunk)
    });

    Body::wrap_stream(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let adapter = BrowserAdapter::new();
        assert_eq!(adapter.name(), "browser");
        assert!(adapter.kind().supports_upload());
        assert!(adapter.kind().supports_download());
    }
}
