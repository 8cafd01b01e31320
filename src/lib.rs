// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # unihttp - Unified Cross-Platform HTTP Layer
//!
//! One request API over the transports of every host platform: browsers,
//! mini-programs, React-Native and HarmonyOS.
//!
//! ## Features
//!
//! - Platform adapters: reqwest-backed browser and React-Native transports,
//!   bridge-backed mini-program and HarmonyOS transports
//! - Adapter factory: platform detection with a per-context adapter cache
//! - Interceptors: ordered request/response chains with error handlers
//! - Retry: exponential, linear or fixed backoff with abort support
//! - Cancellation: `AbortController` signals that tear down in-flight calls
//! - Request cache: TTL caching and dedup of concurrent GETs
//! - Typed errors: one `HttpError` taxonomy for every platform
//!
//! ## Example
//!
//! ```rust,no_run
//! use unihttp::{AdapterContext, HttpClient, PlatformType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = AdapterContext::new().with_platform(PlatformType::H5);
//!     let client = HttpClient::from_context(&context);
//!     client.set_base_url("https://api.example.com");
//!
//!     let user = client.get("/users/1").await?;
//!     println!("{:?}", user.as_json());
//!
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod cache;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod platform;
pub mod unified;

// Re-exports for convenience

// Adapters
pub use adapter::{
    supports_download, supports_upload, AdapterContext, AdapterKind, BrowserAdapter,
    HarmonyAdapter, HttpAdapter, MiniProgramAdapter, PlatformDetector, ReactNativeAdapter,
};

// Host bindings
pub use adapter::{MiniFailure, MiniProgramBridge, OhosError, OhosHttpModule, OhosHttpRequest};

// Cache
pub use cache::{CacheStats, RequestCache};

// Errors
pub use error::{ErrorCode, ErrorContext, HttpError, Result, TransportError};

// HTTP
pub use http::{
    AbortController, AbortSignal, BackoffStrategy, DownloadConfig, DownloadProgress, Headers,
    HttpClient, HttpMethod, HttpResponse, Params, RequestConfig, RequestData, ResponseData,
    ResponseType, RetryConfig, UploadConfig, UploadProgress,
};

// Interceptors
pub use interceptor::{
    AuthHeaderInjector, ErrorHandler, InterceptorItem, InterceptorManager, Interceptors,
    RequestHandler, RequestLogger, ResponseHandler,
};

// Platform
pub use platform::{detect_platform, PlatformInfo, PlatformType};

// Unified client
pub use unified::{CacheOptions, RequestOptions, UnifiedClient, UnifiedClientConfig};

/// unihttp version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
