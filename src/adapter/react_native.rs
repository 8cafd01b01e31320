// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! React-Native adapter
//!
//! Fetch semantics without credential handling. The runtime exposes no
//! transfer progress, so upload and download report 0% when the call starts
//! and 100% once a response arrives.

use async_trait::async_trait;
use reqwest::multipart::Part;
use reqwest::Client;

use super::base::mime_type_for;
use super::fetch::{read_file, FetchTransport};
use super::{AdapterKind, HttpAdapter};
use crate::error::{HttpError, Result};
use crate::http::{
    DownloadConfig, DownloadProgress, DownloadProgressFn, HttpResponse, RequestConfig, UploadConfig,
    UploadProgress, UploadProgressFn,
};

/// Adapter for React-Native runtimes
#[derive(Clone)]
pub struct ReactNativeAdapter {
    transport: FetchTransport,
}

impl ReactNativeAdapter {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            transport: FetchTransport::new(client),
        }
    }
}

impl Default for ReactNativeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// A response arrived, even if its status is an error
fn responded(result: &Result<HttpResponse>) -> bool {
    match result {
        Ok(_) => true,
        Err(err) => err.status.is_some(),
    }
}

#[async_trait]
impl HttpAdapter for ReactNativeAdapter {
    fn name(&self) -> &'static str {
        "react-native"
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
        let file_name = config.file_name();

        let part = Part::bytes(content.to_vec())
            .file_name(file_name.clone())
            .mime_str(mime_type_for(&file_name))
            .map_err(|e| {
                HttpError::unknown(format!("Invalid upload part: {}", e))
                    .with_source(e)
                    .with_config(config.request.clone())
            })?;

        if let Some(cb) = on_progress.as_ref() {
            cb(UploadProgress::synthesized(0, 0));
        }

        let result = self.transport.upload(config, part).await;

        if let Some(cb) = on_progress.as_ref().filter(|_| responded(&result)) {
            cb(UploadProgress::synthesized(100, 0));
        }
        result
    }

    async fn download(
        &self,
        config: &DownloadConfig,
        on_progress: Option<DownloadProgressFn>,
    ) -> Result<HttpResponse> {
        if let Some(cb) = on_progress.as_ref() {
            cb(DownloadProgress::synthesized(0, 0));
        }

        let result = self.transport.download(config, |_, _| {}).await;

        if let Some(cb) = on_progress.as_ref().filter(|_| responded(&result)) {
            cb(DownloadProgress::synthesized(100, 0));
        }
        result
    }
}
