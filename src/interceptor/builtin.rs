// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Ready-made interceptors

use std::sync::Arc;

use async_trait::async_trait;

use super::{ErrorHandler, Interceptors, RequestHandler, ResponseHandler};
use crate::adapter::build_url;
use crate::error::{HttpError, Result};
use crate::http::{headers, HttpResponse, RequestConfig, RequestData};

/// Adds auth headers to outgoing requests
///
/// # Example
///
/// ```rust,no_run
/// use unihttp::{AuthHeaderInjector, HttpClient};
///
/// let client = HttpClient::new();
/// client
///     .interceptors()
///     .request
///     .on_request(AuthHeaderInjector::new().bearer_token("secret"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AuthHeaderInjector {
    headers: Vec<(String, String)>,
    /// Hosts to inject into (empty = all)
    domains: Vec<String>,
}

impl AuthHeaderInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.headers.push((
            headers::AUTHORIZATION.to_string(),
            format!("Bearer {}", token.into()),
        ));
        self
    }

    pub fn basic_auth(mut self, username: &str, password: &str) -> Self {
        let encoded = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            format!("{}:{}", username, password),
        );
        self.headers
            .push((headers::AUTHORIZATION.to_string(), format!("Basic {}", encoded)));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Restrict to hosts containing one of `domains`
    pub fn for_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = domains;
        self
    }

    fn applies_to(&self, config: &RequestConfig) -> bool {
        if self.domains.is_empty() {
            return true;
        }

        url::Url::parse(&build_url(config))
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .map(|host| self.domains.iter().any(|d| host.contains(d.as_str())))
            .unwrap_or(false)
    }
}

#[async_trait]
impl RequestHandler for AuthHeaderInjector {
    async fn on_request(&self, mut config: RequestConfig) -> Result<RequestConfig> {
        if !self.applies_to(&config) {
            return Ok(config);
        }

        for (name, value) in &self.headers {
            config.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
            config.headers.insert(name.clone(), value.clone());
        }
        Ok(config)
    }
}

/// Logs requests, responses and failures through `tracing`
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    /// Log request bodies
    pub log_bodies: bool,
    /// Log response bodies
    pub log_responses: bool,
    /// Only log URLs containing this
    pub url_filter: Option<String>,
}

impl RequestLogger {
    /// Register on both chains of `interceptors`; returns the request and response ids
    pub fn install(self, interceptors: &Interceptors) -> (u64, u64) {
        let logger = Arc::new(self);
        let request_id = interceptors.request.add(
            Some(logger.clone() as Arc<dyn RequestHandler>),
            Some(logger.clone() as Arc<dyn ErrorHandler>),
        );
        let response_id = interceptors.response.add(
            Some(logger.clone() as Arc<dyn ResponseHandler>),
            Some(logger as Arc<dyn ErrorHandler>),
        );
        (request_id, response_id)
    }

    fn matches(&self, url: &str) -> bool {
        self.url_filter
            .as_deref()
            .map_or(true, |filter| url.contains(filter))
    }
}

#[async_trait]
impl RequestHandler for RequestLogger {
    async fn on_request(&self, config: RequestConfig) -> Result<RequestConfig> {
        if self.matches(&config.url) {
            tracing::info!(
                method = %config.method_or_default(),
                url = %build_url(&config),
                "Request"
            );

            if self.log_bodies {
                match config.data.as_ref() {
                    Some(RequestData::Json(value)) => tracing::debug!(body = %value, "Request body"),
                    Some(RequestData::Text(text)) => tracing::debug!(body = %text, "Request body"),
                    Some(RequestData::Binary(bytes)) => {
                        tracing::debug!(len = bytes.len(), "Request body (binary)")
                    }
                    None => {}
                }
            }
        }
        Ok(config)
    }
}

#[async_trait]
impl ResponseHandler for RequestLogger {
    async fn on_response(&self, response: HttpResponse) -> Result<HttpResponse> {
        if self.matches(&response.config.url) {
            tracing::info!(
                url = %response.config.url,
                status = response.status,
                "Response"
            );

            if self.log_responses {
                tracing::debug!(body = ?response.data, "Response body");
            }
        }
        Ok(response)
    }
}

#[async_trait]
impl ErrorHandler for RequestLogger {
    async fn on_error(&self, error: HttpError) {
        let url = error.url().unwrap_or_default();
        if self.matches(url) {
            tracing::warn!(
                code = %error.code,
                status = ?error.status,
                url = %url,
                "Request failed: {}",
                error.message
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auth_injector() {
        let injector = AuthHeaderInjector::new()
            .bearer_token("test_token")
            .header("x-custom", "value");

        let config = RequestConfig::new("https://api.example.com/me")
            .header("Authorization", "stale");
        let config = injector.on_request(config).await.unwrap();

        assert_eq!(config.header_value("authorization"), Some("Bearer test_token"));
        assert_eq!(config.header_value("x-custom"), Some("value"));
        assert_eq!(config.headers.len(), 2);
    }

    #[tokio::test]
    async fn test_basic_auth() {
        let injector = AuthHeaderInjector::new().basic_auth("user", "pass");
        let config = injector.on_request(RequestConfig::new("/x")).await.unwrap();
        assert_eq!(config.header_value("authorization"), Some("Basic dXNlcjpwYXNz"));
    }

    #[tokio::test]
    async fn test_domain_filter() {
        let injector = AuthHeaderInjector::new()
            .bearer_token("t")
            .for_domains(vec!["example.com".into()]);

        let hit = RequestConfig::new("/users").base_url("https://api.example.com");
        let hit = injector.on_request(hit).await.unwrap();
        assert!(hit.header_value("authorization").is_some());

        let miss = injector
            .on_request(RequestConfig::new("https://other.org/users"))
            .await
            .unwrap();
        assert!(miss.header_value("authorization").is_none());
    }

    #[tokio::test]
    async fn test_logger_install_and_passthrough() {
        let interceptors = Interceptors::default();
        let (req, res) = RequestLogger {
            log_bodies: true,
            ..Default::default()
        }
        .install(&interceptors);
        assert_eq!((req, res), (0, 0));

        let config = RequestConfig::new("/x").data(serde_json::json!({"a": 1}));
        let out = interceptors.request.run(config).await.unwrap();
        assert_eq!(out.url, "/x");
    }
}
