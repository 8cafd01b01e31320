// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client layer
//!
//! Request/response data model, cancellation, retry policy and the
//! interceptor-driven [`HttpClient`].

mod abort;
mod client;
mod config;
mod response;
mod retry;

pub use abort::{AbortController, AbortSignal};
pub(crate) use abort::aborted;
pub use client::HttpClient;
pub use config::{
    DownloadConfig, DownloadProgress, DownloadProgressFn, Headers, HttpMethod, Params,
    ProgressHandler, RequestConfig, RequestData, ResponseType, UploadConfig, UploadProgress,
    UploadProgressFn,
};
pub use response::{HttpResponse, ResponseData};
pub use retry::{BackoffStrategy, RetryConfig, RetryPredicate};

/// Default client timeout
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Default delay before the first retry
pub const DEFAULT_RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(1000);

/// Common HTTP headers
pub mod headers {
    pub const ACCEPT: &str = "accept";
    pub const AUTHORIZATION: &str = "authorization";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_LENGTH: &str = "content-length";
    pub const COOKIE: &str = "cookie";
    pub const SET_COOKIE: &str = "set-cookie";

    pub const APPLICATION_JSON: &str = "application/json";
    pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}
