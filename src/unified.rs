// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Higher-level client with GET caching, request dedup and policy-driven retry

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, info_span, Instrument};

use crate::adapter::{build_url, merge_headers, AdapterContext, HttpAdapter};
use crate::cache::{CacheStats, RequestCache};
use crate::error::Result;
use crate::http::headers::{APPLICATION_JSON, CONTENT_TYPE};
use crate::http::{
    Headers, HttpMethod, Params, RequestConfig, RequestData, ResponseData, RetryConfig,
};
use crate::interceptor::{ErrorHandler, Interceptors, RequestHandler, ResponseHandler};

/// Default timeout of the unified client
pub const DEFAULT_UNIFIED_TIMEOUT: Duration = Duration::from_secs(10);

/// Default lifetime of a cached GET response
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Construction settings for [`UnifiedClient`]
#[derive(Clone)]
pub struct UnifiedClientConfig {
    /// Prefix for relative URLs
    pub base_url: String,
    pub headers: Headers,
    pub timeout: Duration,
    /// Transport; detected through [`AdapterContext`] when absent
    pub adapter: Option<Arc<dyn HttpAdapter>>,
    /// Cache successful GET responses
    pub enable_cache: bool,
    pub cache_ttl: Duration,
    /// Retry policy used unless a request supplies its own
    pub retry: RetryConfig,
}

impl Default for UnifiedClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            headers: Headers::from([(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())]),
            timeout: DEFAULT_UNIFIED_TIMEOUT,
            adapter: None,
            enable_cache: false,
            cache_ttl: DEFAULT_CACHE_TTL,
            retry: RetryConfig::unified_default(),
        }
    }
}

impl UnifiedClientConfig {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the default headers
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn adapter(mut self, adapter: Arc<dyn HttpAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn enable_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl fmt::Debug for UnifiedClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnifiedClientConfig")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .field("adapter", &self.adapter.as_ref().map(|a| a.name()))
            .field("enable_cache", &self.enable_cache)
            .field("cache_ttl", &self.cache_ttl)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Per-request cache behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// `false` bypasses the cache even when the client enables it
    pub enabled: bool,
    /// Skip lookup and dedup, but still store the fresh result
    pub force_refresh: bool,
    /// Overrides the client TTL
    pub ttl: Option<Duration>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            force_refresh: false,
            ttl: None,
        }
    }
}

/// A request plus its cache and retry overrides
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub config: RequestConfig,
    pub cache: CacheOptions,
    pub retry: Option<RetryConfig>,
}

impl RequestOptions {
    pub fn new(url: impl Into<String>) -> Self {
        RequestConfig::new(url).into()
    }

    pub fn no_cache(mut self) -> Self {
        self.cache.enabled = false;
        self
    }

    pub fn force_refresh(mut self) -> Self {
        self.cache.force_refresh = true;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl = Some(ttl);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }
}

impl From<RequestConfig> for RequestOptions {
    fn from(config: RequestConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}

/// Interceptors, adapter and retry for one call; owned so it can back a
/// shared dedup future
#[derive(Clone)]
struct Pipeline {
    adapter: Arc<dyn HttpAdapter>,
    interceptors: Arc<Interceptors>,
}

impl Pipeline {
    async fn run(self, config: RequestConfig, retry: RetryConfig) -> Result<ResponseData> {
        let fallback = config.clone();
        match self.execute(config, retry).await {
            Ok(data) => Ok(data),
            Err(err) => {
                let err = err.or_config(&fallback);
                self.interceptors.response.notify_error(&err).await;
                Err(err)
            }
        }
    }

    async fn execute(&self, config: RequestConfig, retry: RetryConfig) -> Result<ResponseData> {
        let config = self.interceptors.request.run(config).await?;

        let adapter = &self.adapter;
        let response = retry
            .run(config.signal.as_ref(), |_| adapter.request(&config))
            .await?;

        Ok(self.interceptors.response.run(response).await?.data)
    }
}

/// Caching, retrying client over one adapter
///
/// ```rust,no_run
/// use unihttp::{UnifiedClient, UnifiedClientConfig};
///
/// # async fn demo() -> unihttp::Result<()> {
/// let client = UnifiedClient::new(
///     UnifiedClientConfig::default()
///         .base_url("https://api.example.com")
///         .enable_cache(true),
/// );
/// let _user = client.get("/users/1").await?;
/// # Ok(())
/// # }
/// ```
pub struct UnifiedClient {
    base_url: String,
    headers: Headers,
    timeout: Duration,
    enable_cache: bool,
    cache_ttl: Duration,
    retry: RetryConfig,
    pipeline: Pipeline,
    cache: RequestCache<ResponseData>,
}

impl UnifiedClient {
    pub fn new(config: UnifiedClientConfig) -> Self {
        Self::with_context(config, &AdapterContext::new())
    }

    /// Use `context` to pick the adapter when the config has none
    pub fn with_context(config: UnifiedClientConfig, context: &AdapterContext) -> Self {
        let adapter = config
            .adapter
            .unwrap_or_else(|| context.create_adapter(true));

        Self {
            base_url: config.base_url,
            headers: config.headers,
            timeout: config.timeout,
            enable_cache: config.enable_cache,
            cache_ttl: config.cache_ttl,
            retry: config.retry,
            pipeline: Pipeline {
                adapter,
                interceptors: Arc::new(Interceptors::default()),
            },
            cache: RequestCache::new(),
        }
    }

    pub fn adapter(&self) -> &Arc<dyn HttpAdapter> {
        &self.pipeline.adapter
    }

    pub fn interceptors(&self) -> &Interceptors {
        &self.pipeline.interceptors
    }

    pub fn add_request_interceptor(
        &self,
        on_fulfilled: Option<Arc<dyn RequestHandler>>,
        on_rejected: Option<Arc<dyn ErrorHandler>>,
    ) -> u64 {
        self.pipeline.interceptors.request.add(on_fulfilled, on_rejected)
    }

    pub fn add_response_interceptor(
        &self,
        on_fulfilled: Option<Arc<dyn ResponseHandler>>,
        on_rejected: Option<Arc<dyn ErrorHandler>>,
    ) -> u64 {
        self.pipeline.interceptors.response.add(on_fulfilled, on_rejected)
    }

    pub fn eject_request_interceptor(&self, id: u64) -> bool {
        self.pipeline.interceptors.request.eject(id)
    }

    pub fn eject_response_interceptor(&self, id: u64) -> bool {
        self.pipeline.interceptors.response.eject(id)
    }

    /// Base-joined URL without params
    fn resolve_url(&self, url: &str) -> String {
        build_url(&RequestConfig::new(url).base_url(self.base_url.as_str()))
    }

    fn cache_key(&self, url: &str, params: Option<&Params>) -> String {
        RequestCache::<ResponseData>::generate_key(&self.resolve_url(url), params)
    }

    /// Execute a request and return its data
    pub async fn request(&self, options: impl Into<RequestOptions>) -> Result<ResponseData> {
        let RequestOptions {
            config: mut request,
            cache,
            retry,
        } = options.into();

        let method = request.method_or_default();
        let key = self.cache_key(&request.url, request.params.as_ref());

        if request.base_url.is_none() {
            request.base_url = Some(self.base_url.clone());
        }
        request.url = build_url(&request);
        request.base_url = None;
        request.params = None;
        request.method = Some(method);
        request.headers = merge_headers(&self.headers, &request.headers);
        request.timeout = request.timeout.or(Some(self.timeout));

        let retry = retry.unwrap_or_else(|| self.retry.clone());
        let cacheable = self.enable_cache && cache.enabled && method == HttpMethod::Get;
        let ttl = cache.ttl.unwrap_or(self.cache_ttl);
        let span = info_span!("unified_request", %method, url = %request.url);

        async {
            if cacheable && !cache.force_refresh {
                let pipeline = self.pipeline.clone();
                return self
                    .cache
                    .get_or_fetch(&key, ttl, move || pipeline.run(request, retry))
                    .await;
            }

            let data = self.pipeline.clone().run(request, retry).await?;
            if cacheable {
                debug!(key = %key, "Refreshing cached response");
                self.cache.set(key.clone(), data.clone(), ttl);
            }
            Ok(data)
        }
        .instrument(span)
        .await
    }

    /// [`request`](Self::request) with the data deserialized into `T`
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        options: impl Into<RequestOptions>,
    ) -> Result<T> {
        Ok(self.request(options).await?.into_typed()?)
    }

    pub async fn get(&self, url: impl Into<String>) -> Result<ResponseData> {
        self.request(RequestConfig::new(url).method(HttpMethod::Get))
            .await
    }

    pub async fn post(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
    ) -> Result<ResponseData> {
        self.request(RequestConfig::new(url).method(HttpMethod::Post).data(data))
            .await
    }

    pub async fn put(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
    ) -> Result<ResponseData> {
        self.request(RequestConfig::new(url).method(HttpMethod::Put).data(data))
            .await
    }

    pub async fn patch(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
    ) -> Result<ResponseData> {
        self.request(RequestConfig::new(url).method(HttpMethod::Patch).data(data))
            .await
    }

    pub async fn delete(&self, url: impl Into<String>) -> Result<ResponseData> {
        self.request(RequestConfig::new(url).method(HttpMethod::Delete))
            .await
    }

    /// Drop the entry for `url` + `params`, or everything when `url` is `None`
    pub fn clear_cache(&self, url: Option<&str>, params: Option<&Params>) {
        match url {
            Some(url) => self.cache.clear(&self.cache_key(url, params)),
            None => self.cache.clear_all(),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl fmt::Debug for UnifiedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnifiedClient")
            .field("base_url", &self.base_url)
            .field("adapter", &self.pipeline.adapter.name())
            .field("enable_cache", &self.enable_cache)
            .field("cache", &self.cache.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::mock::{MockAdapter, Reply};
    use crate::error::{ErrorCode, HttpError};
    use serde_json::json;

    fn client(mock: MockAdapter, enable_cache: bool) -> (UnifiedClient, Arc<MockAdapter>) {
        let mock = Arc::new(mock);
        let client = UnifiedClient::new(
            UnifiedClientConfig::default()
                .base_url("https://api.example.com/")
                .adapter(mock.clone())
                .enable_cache(enable_cache)
                .retry(RetryConfig::none()),
        );
        (client, mock)
    }

    #[tokio::test]
    async fn test_builds_full_request() {
        let (client, mock) = client(MockAdapter::new(), false);
        client
            .request(
                RequestConfig::new("/users")
                    .param("page", 2)
                    .header("X-Trace", "1"),
            )
            .await
            .unwrap();

        let seen = mock.seen.lock();
        assert_eq!(seen[0].url, "https://api.example.com/users?page=2");
        assert_eq!(seen[0].method, Some(HttpMethod::Get));
        assert_eq!(seen[0].timeout, Some(DEFAULT_UNIFIED_TIMEOUT));
        assert_eq!(seen[0].header_value(CONTENT_TYPE), Some(APPLICATION_JSON));
        assert_eq!(seen[0].header_value("x-trace"), Some("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_gets_deduplicated() {
        let mock = MockAdapter::new()
            .with_delay(Duration::from_millis(50))
            .always(|| Reply::Ok(200, ResponseData::Json(json!({"id": 1}))));
        let (client, mock) = client(mock, true);

        let (a, b, c) = tokio::join!(
            client.get("/users/1"),
            client.get("/users/1"),
            client.get("/users/1")
        );
        assert_eq!(a.unwrap().as_json(), Some(&json!({"id": 1})));
        assert!(b.is_ok() && c.is_ok());
        assert_eq!(mock.call_count(), 1);

        // Served from cache
        client.get("/users/1").await.unwrap();
        assert_eq!(mock.call_count(), 1);
        assert_eq!(client.cache_stats(), CacheStats { entries: 1, pending: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expiry_and_force_refresh() {
        let (client, mock) = client(MockAdapter::new(), true);

        client
            .request(RequestOptions::new("/a").cache_ttl(Duration::from_secs(1)))
            .await
            .unwrap();
        client.get("/a").await.unwrap();
        assert_eq!(mock.call_count(), 1);

        tokio::time::advance(Duration::from_millis(1001)).await;
        client.get("/a").await.unwrap();
        assert_eq!(mock.call_count(), 2);

        client
            .request(RequestOptions::new("/a").force_refresh())
            .await
            .unwrap();
        assert_eq!(mock.call_count(), 3);

        client
            .request(RequestOptions::new("/a").no_cache())
            .await
            .unwrap();
        assert_eq!(mock.call_count(), 4);
    }

    #[tokio::test]
    async fn test_post_never_cached() {
        let (client, mock) = client(MockAdapter::new(), true);
        client.post("/a", json!({"x": 1})).await.unwrap();
        client.post("/a", json!({"x": 1})).await.unwrap();
        assert_eq!(mock.call_count(), 2);
        assert_eq!(client.cache_stats().entries, 0);
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let (client, mock) = client(MockAdapter::new(), true);
        client.get("/a").await.unwrap();
        client.get("/b").await.unwrap();
        assert_eq!(client.cache_stats().entries, 2);

        client.clear_cache(Some("/a"), None);
        assert_eq!(client.cache_stats().entries, 1);
        client.get("/a").await.unwrap();
        assert_eq!(mock.call_count(), 3);

        client.clear_cache(None, None);
        assert_eq!(client.cache_stats().entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_retry_policy() {
        let mock = MockAdapter::new()
            .reply(Reply::Err(HttpError::network("down")))
            .reply(Reply::Ok(503, ResponseData::Text("busy".into())))
            .reply(Reply::Ok(200, ResponseData::Text("ok".into())));
        let mock = Arc::new(mock);
        let client = UnifiedClient::new(UnifiedClientConfig::default().adapter(mock.clone()));

        let started = tokio::time::Instant::now();
        let data = client.get("/flaky").await.unwrap();
        assert_eq!(data.as_text(), Some("ok"));
        assert_eq!(mock.call_count(), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(1000 + 2000));

        let mock = Arc::new(MockAdapter::new().always(|| Reply::Ok(404, ResponseData::Text("no".into()))));
        let client = UnifiedClient::new(UnifiedClientConfig::default().adapter(mock.clone()));
        let err = client.get("/missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ClientError);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_interceptors_add_and_eject() {
        let (client, mock) = client(MockAdapter::new(), false);
        let id = client.add_request_interceptor(
            Some(Arc::new(|config: RequestConfig| async move {
                Ok::<_, HttpError>(config.header("X-Tag", "on"))
            })),
            None,
        );

        client.get("/a").await.unwrap();
        assert!(client.eject_request_interceptor(id));
        client.get("/a").await.unwrap();

        let seen = mock.seen.lock();
        assert_eq!(seen[0].header_value("x-tag"), Some("on"));
        assert_eq!(seen[1].header_value("x-tag"), None);
    }

    #[tokio::test]
    async fn test_request_as() {
        #[derive(serde::Deserialize)]
        struct User {
            id: u32,
        }

        let mock = MockAdapter::new().reply(Reply::Ok(200, ResponseData::Json(json!({"id": 3}))));
        let (client, _) = client(mock, false);
        let user: User = client.request_as(RequestOptions::new("/users/3")).await.unwrap();
        assert_eq!(user.id, 3);
    }
}
