// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Browser adapter against a local mock server

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::json;
use unihttp::{
    AdapterContext, BrowserAdapter, DownloadConfig, ErrorCode, HttpClient, PlatformType,
    RequestConfig, ResponseData, UploadConfig,
};
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> HttpClient {
    let context = AdapterContext::new().with_platform(PlatformType::H5);
    let client = HttpClient::from_context(&context);
    client.set_base_url(server.uri());
    client
}

#[tokio::test]
async fn get_returns_parsed_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert_eq!(client.adapter().name(), "browser");

    let data = client.get("/users/1").await.unwrap();
    assert_eq!(data, ResponseData::Json(json!({"id": 1})));
}

#[tokio::test]
async fn not_found_is_client_error() {
    let server = MockServer::start().await;
    Mock::given(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get("/missing").await.unwrap_err();

    assert_eq!(err.code, ErrorCode::ClientError);
    assert_eq!(err.status, Some(404));
    assert_eq!(err.message, "Request failed with status 404");
    let response = err.response.as_ref().unwrap();
    assert_eq!(response.data.as_text(), Some("nope"));
    assert!(err.url().unwrap().ends_with("/missing"));
}

#[tokio::test]
async fn server_error_is_classified() {
    let server = MockServer::start().await;
    Mock::given(path("/boom"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get("/boom").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ServerError);
    assert_eq!(err.status, Some(503));
}

#[tokio::test]
async fn retries_until_success() {
    let server = MockServer::start().await;
    Mock::given(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .request(RequestConfig::new("/flaky").retry(2, Duration::from_millis(10)))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.data.as_text(), Some("ok"));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .request(RequestConfig::new("/slow").timeout(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Timeout);
}

#[tokio::test]
async fn abort_rejects_promptly() {
    let server = MockServer::start().await;
    Mock::given(path("/hang"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let controller = client.create_abort_controller();
    let config = RequestConfig::new("/hang").signal(controller.signal());

    let started = Instant::now();
    let pending = tokio::spawn({
        let client = client.clone();
        async move { client.request(config).await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    controller.abort();

    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(err.code, ErrorCode::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn refused_connection_is_network_error() {
    let client = HttpClient::with_adapter(Arc::new(BrowserAdapter::new()));
    let err = client.get("http://127.0.0.1:1/unreachable").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NetworkError);
    assert!(err.original_error.is_some());
}

#[tokio::test]
async fn params_headers_and_body_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .and(header("x-app", "demo"))
        .and(body_json(json!({"q": "rust"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .request(
            RequestConfig::new("/search")
                .method(unihttp::HttpMethod::Post)
                .param("page", 2)
                .header("X-App", "demo")
                .data(json!({"q": "rust"})),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.data.as_json(), Some(&json!({"ok": true})));
}

#[tokio::test]
async fn lowercase_content_type_overrides_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/form"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("a=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .request(
            RequestConfig::new("/form")
                .method(unihttp::HttpMethod::Post)
                .header("content-type", "application/x-www-form-urlencoded")
                .data(json!({"a": 1})),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.data.as_text(), Some("ok"));
}

#[tokio::test]
async fn cookies_follow_credentials_mode() {
    let server = MockServer::start().await;
    Mock::given(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "session=abc; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(path("/me"))
        .and(header("cookie", "session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("authed"))
        .mount(&server)
        .await;
    Mock::given(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client
        .request(RequestConfig::new("/login").with_credentials(true))
        .await
        .unwrap();

    let err = client.get("/me").await.unwrap_err();
    assert_eq!(err.status, Some(401));

    let response = client
        .request(RequestConfig::new("/me").with_credentials(true))
        .await
        .unwrap();
    assert_eq!(response.data.as_text(), Some("authed"));
}

#[tokio::test]
async fn upload_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stored": true})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("report.txt");
    std::fs::write(&file, vec![b'x'; 4096]).unwrap();

    let progress = Arc::new(Mutex::new(Vec::new()));
    let sink = progress.clone();
    let mut config = UploadConfig::new("/files", &file).field("owner", "ci");
    config.request = config
        .request
        .on_upload_progress(move |p| sink.lock().push(p));

    let client = client_for(&server).await;
    let data = client.upload(config).await.unwrap();

    assert_eq!(data.as_json(), Some(&json!({"stored": true})));
    assert_eq!(progress.lock().last(), Some(&100));
}

#[tokio::test]
async fn download_writes_file() {
    let server = MockServer::start().await;
    let payload = vec![7u8; 10_000];
    Mock::given(path("/blob"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested").join("blob.bin");

    let progress = Arc::new(Mutex::new(Vec::new()));
    let sink = progress.clone();
    let mut config = DownloadConfig::new("/blob").file_path(&target);
    config.request = config
        .request
        .on_download_progress(move |p| sink.lock().push(p));

    let client = client_for(&server).await;
    let data = client.download(config).await.unwrap();

    assert_eq!(data, ResponseData::File(target.clone()));
    assert_eq!(std::fs::read(&target).unwrap(), payload);
    assert_eq!(progress.lock().last(), Some(&100));
}
