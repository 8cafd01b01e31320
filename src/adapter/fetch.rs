// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Fetch-style transport over reqwest
//!
//! Shared by the browser and React-Native adapters. Cookies are handled
//! here rather than by reqwest so one client serves both credential modes.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, trace};
use url::Url;

use super::base::{build_url, check_status, decode_body, merge_headers, serialize_data, status_text};
use crate::error::{HttpError, Result};
use crate::http::headers::APPLICATION_JSON;
use crate::http::{
    aborted, DownloadConfig, Headers, HttpMethod, HttpResponse, RequestConfig, ResponseData,
    UploadConfig,
};

/// reqwest client plus an optional cookie jar for credentialed requests
#[derive(Clone)]
pub(crate) struct FetchTransport {
    client: Client,
    jar: Option<Arc<Jar>>,
}

impl FetchTransport {
    /// Transport that never sends or stores cookies
    pub fn new(client: Client) -> Self {
        Self { client, jar: None }
    }

    /// Transport that keeps cookies for `with_credentials` requests
    pub fn with_cookies(client: Client) -> Self {
        Self {
            client,
            jar: Some(Arc::new(Jar::default())),
        }
    }

    /// Plain request with fetch semantics
    pub async fn request(&self, config: &RequestConfig) -> Result<HttpResponse> {
        let url = parse_url(config, &build_url(config))?;
        let method = config.method_or_default();

        let mut defaults = Headers::new();
        defaults.insert(crate::http::headers::CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
        let headers = merge_headers(&defaults, &config.headers);

        let mut builder = self.client.request(method.into(), url.clone());
        builder = apply_headers(builder, &headers);

        if method.has_body() {
            let content_type = headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                .map(|(_, v)| v.as_str());
            if let Some(body) = serialize_data(config.data.as_ref(), content_type) {
                builder = builder.body(body.into_bytes());
            }
        }

        debug!(%method, %url, "Dispatching fetch request");

        let exchange = async {
            let response = self.send(builder, &url, config).await?;
            let status = response.status();
            let headers = header_map_to_headers(response.headers());
            let body = response
                .bytes()
                .await
                .map_err(|e| classify_error(e, config))?;

            let content_type = headers.get("content-type").cloned().unwrap_or_default();
            let data = decode_body(body, &content_type, config.response_type);
            Ok(HttpResponse::new(
                data,
                status.as_u16(),
                reason(status),
                headers,
                config.clone(),
            ))
        };

        let response = with_abort(config, exchange).await?;
        check_status("Request", response)
    }

    /// Multipart POST of `file_part` plus the extra form fields
    pub async fn upload(&self, config: &UploadConfig, file_part: Part) -> Result<HttpResponse> {
        let request = &config.request;
        let url = parse_url(request, &build_url(request))?;

        let mut form = Form::new();
        for (key, value) in &config.form_data {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            form = form.text(key.clone(), text);
        }
        form = form.part(config.field_name().to_string(), file_part);

        // reqwest sets the multipart boundary itself
        let headers: Headers = request
            .headers
            .iter()
            .filter(|(k, _)| !k.eq_ignore_ascii_case("content-type"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut builder = self.client.request(HttpMethod::Post.into(), url.clone());
        builder = apply_headers(builder, &headers).multipart(form);

        debug!(%url, field = config.field_name(), "Dispatching multipart upload");

        let exchange = async {
            let response = self.send(builder, &url, request).await?;
            let status = response.status();
            let headers = header_map_to_headers(response.headers());
            let body = response
                .bytes()
                .await
                .map_err(|e| classify_error(e, request))?;

            Ok(HttpResponse::new(
                ResponseData::from_text(String::from_utf8_lossy(&body).into_owned()),
                status.as_u16(),
                reason(status),
                headers,
                request.clone(),
            ))
        };

        let response = with_abort(request, exchange).await?;
        check_status("Upload", response)
    }

    /// GET streamed chunk by chunk
    ///
    /// `on_chunk` receives bytes received so far and the content length when
    /// the server announced one. The body is written to `file_path` when set.
    pub async fn download<F>(&self, config: &DownloadConfig, mut on_chunk: F) -> Result<HttpResponse>
    where
        F: FnMut(u64, Option<u64>) + Send,
    {
        let request = &config.request;
        let url = parse_url(request, &build_url(request))?;

        let mut builder = self.client.request(HttpMethod::Get.into(), url.clone());
        builder = apply_headers(builder, &request.headers);

        debug!(%url, "Dispatching download");

        let exchange = async {
            let mut response = self.send(builder, &url, request).await?;
            let status = response.status();
            let headers = header_map_to_headers(response.headers());
            let total = response.content_length();

            let mut body = BytesMut::new();
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| classify_error(e, request))?
            {
                body.extend_from_slice(&chunk);
                trace!(received = body.len(), ?total, "Download chunk");
                on_chunk(body.len() as u64, total);
            }

            Ok((status, headers, body.freeze()))
        };

        let (status, headers, body) = with_abort(request, exchange).await?;

        let response = HttpResponse::new(
            ResponseData::Binary(body.clone()),
            status.as_u16(),
            reason(status),
            headers,
            request.clone(),
        );
        let response = check_status("Download", response)?;

        match &config.file_path {
            Some(path) => {
                write_file(path, &body).await.map_err(|e| e.or_config(request))?;
                Ok(response.map(|_| ResponseData::File(path.clone())))
            }
            None => Ok(response),
        }
    }

    /// Attach cookies when credentialed, send, and store returned cookies
    async fn send(
        &self,
        mut builder: RequestBuilder,
        url: &Url,
        config: &RequestConfig,
    ) -> Result<reqwest::Response> {
        let jar = self
            .jar
            .as_ref()
            .filter(|_| config.with_credentials.unwrap_or(false));

        if let Some(jar) = jar {
            if let Some(cookies) = jar.cookies(url) {
                builder = builder.header(COOKIE, cookies);
            }
        }

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| classify_error(e, config))?;

        if let Some(jar) = jar {
            let mut set_cookies = response.headers().get_all(SET_COOKIE).iter();
            jar.set_cookies(&mut set_cookies, response.url());
        }

        Ok(response)
    }
}

/// Race `exchange` against the request's abort signal
///
/// Dropping the losing future tears down the connection.
pub(crate) async fn with_abort<T>(
    config: &RequestConfig,
    exchange: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = aborted(config.signal.as_ref()) => {
            debug!(url = %config.url, "Request aborted");
            Err(HttpError::cancelled("Request cancelled").with_config(config.clone()))
        }
        res = exchange => res,
    }
}

/// Map a reqwest failure onto the error taxonomy
pub(crate) fn classify_error(err: reqwest::Error, config: &RequestConfig) -> HttpError {
    let classified = if err.is_timeout() {
        HttpError::timeout("Request timeout")
    } else if err.is_builder() {
        HttpError::unknown(err.to_string())
    } else if err.is_decode() {
        HttpError::invalid_response(err.to_string())
    } else {
        HttpError::network("Network error")
    };
    classified.with_source(err).with_config(config.clone())
}

fn parse_url(config: &RequestConfig, url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| {
        HttpError::unknown(format!("Invalid URL '{}': {}", url, e)).with_config(config.clone())
    })
}

fn apply_headers(mut builder: RequestBuilder, headers: &Headers) -> RequestBuilder {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Lower-case header map; repeated headers are joined with `, `
pub(crate) fn header_map_to_headers(map: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_ascii_lowercase())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    headers
}

fn reason(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or_else(|| status_text(status.as_u16()))
        .to_string()
}

pub(crate) async fn write_file(path: &Path, body: &Bytes) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, body).await?;
    Ok(())
}

pub(crate) async fn read_file(path: &Path) -> Result<Bytes> {
    let content = tokio::fs::read(path).await.map_err(|e| {
        HttpError::unknown(format!("Failed to read {}: {}", path.display(), e)).with_source(e)
    })?;
    Ok(Bytes::from(content))
}
