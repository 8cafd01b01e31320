// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request and response interceptor chains
//!
//! Handlers run strictly in registration order; there is no priority. Each
//! registration gets an id from a per-manager counter and ids are never
//! reused, so `eject` with a stale id is a no-op.

mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{HttpError, Result};
use crate::http::{HttpResponse, RequestConfig};

pub use builtin::{AuthHeaderInjector, RequestLogger};

/// Transforms the outgoing config
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn on_request(&self, config: RequestConfig) -> Result<RequestConfig>;
}

/// Transforms a successful response
#[async_trait]
pub trait ResponseHandler: Send + Sync {
    async fn on_response(&self, response: HttpResponse) -> Result<HttpResponse>;
}

/// Observes a failure
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn on_error(&self, error: HttpError);
}

#[async_trait]
impl<F, Fut> RequestHandler for F
where
    F: Fn(RequestConfig) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RequestConfig>> + Send,
{
    async fn on_request(&self, config: RequestConfig) -> Result<RequestConfig> {
        (self)(config).await
    }
}

#[async_trait]
impl<F, Fut> ResponseHandler for F
where
    F: Fn(HttpResponse) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse>> + Send,
{
    async fn on_response(&self, response: HttpResponse) -> Result<HttpResponse> {
        (self)(response).await
    }
}

#[async_trait]
impl<F, Fut> ErrorHandler for F
where
    F: Fn(HttpError) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn on_error(&self, error: HttpError) {
        (self)(error).await
    }
}

/// One registration: success handler and error handler, both optional
pub struct InterceptorItem<F: ?Sized, R: ?Sized> {
    pub on_fulfilled: Option<Arc<F>>,
    pub on_rejected: Option<Arc<R>>,
}

impl<F: ?Sized, R: ?Sized> Clone for InterceptorItem<F, R> {
    fn clone(&self) -> Self {
        Self {
            on_fulfilled: self.on_fulfilled.clone(),
            on_rejected: self.on_rejected.clone(),
        }
    }
}

/// Ordered, id-keyed interceptor registry
pub struct InterceptorManager<F: ?Sized, R: ?Sized> {
    items: RwLock<BTreeMap<u64, InterceptorItem<F, R>>>,
    next_id: AtomicU64,
}

impl<F: ?Sized, R: ?Sized> InterceptorManager<F, R> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register handlers; returns the id for [`eject`](Self::eject)
    pub fn add(&self, on_fulfilled: Option<Arc<F>>, on_rejected: Option<Arc<R>>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.items.write().insert(
            id,
            InterceptorItem {
                on_fulfilled,
                on_rejected,
            },
        );
        id
    }

    /// Remove a registration; returns whether it existed
    pub fn eject(&self, id: u64) -> bool {
        self.items.write().remove(&id).is_some()
    }

    pub fn clear(&self) {
        self.items.write().clear();
    }

    /// Snapshot of the registrations in insertion order
    pub fn get_all(&self) -> Vec<InterceptorItem<F, R>> {
        self.items.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl<F: ?Sized, R: ?Sized> Default for InterceptorManager<F, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized, R: ?Sized> fmt::Debug for InterceptorManager<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorManager")
            .field("len", &self.len())
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .finish()
    }
}

pub type RequestInterceptors = InterceptorManager<dyn RequestHandler, dyn ErrorHandler>;
pub type ResponseInterceptors = InterceptorManager<dyn ResponseHandler, dyn ErrorHandler>;

/// Both chains of a client
#[derive(Debug, Default)]
pub struct Interceptors {
    pub request: RequestInterceptors,
    pub response: ResponseInterceptors,
}

/// Await a handler future, turning a panic into `UNKNOWN`
async fn guarded<T>(fut: impl Future<Output = Result<T>>) -> Result<T> {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(payload) => Err(HttpError::unknown(format!(
            "Interceptor panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Notify every error handler in `items`; handler panics are logged and dropped
async fn notify<F: ?Sized>(items: &[InterceptorItem<F, dyn ErrorHandler>], error: &HttpError) {
    for handler in items.iter().filter_map(|item| item.on_rejected.as_ref()) {
        let res = guarded(async {
            handler.on_error(error.clone()).await;
            Ok(())
        })
        .await;
        if let Err(e) = res {
            warn!(error = %e, "Error interceptor failed");
        }
    }
}

impl InterceptorManager<dyn RequestHandler, dyn ErrorHandler> {
    /// Register a success handler only
    pub fn on_request(&self, handler: impl RequestHandler + 'static) -> u64 {
        self.add(Some(Arc::new(handler)), None)
    }

    /// Register a success handler and its error handler
    pub fn on_request_or_error(
        &self,
        handler: impl RequestHandler + 'static,
        on_error: impl ErrorHandler + 'static,
    ) -> u64 {
        self.add(Some(Arc::new(handler)), Some(Arc::new(on_error)))
    }

    /// Thread `config` through every success handler in order
    ///
    /// A failing handler's own error handler is notified before the error
    /// is returned; later handlers do not run.
    pub async fn run(&self, mut config: RequestConfig) -> Result<RequestConfig> {
        for item in self.get_all() {
            let Some(handler) = item.on_fulfilled.as_ref() else {
                continue;
            };

            match guarded(handler.on_request(config.clone())).await {
                Ok(next) => config = next,
                Err(err) => {
                    let err = err.or_config(&config);
                    debug!(code = %err.code, "Request interceptor failed");
                    notify(std::slice::from_ref(&item), &err).await;
                    return Err(err);
                }
            }
        }
        Ok(config)
    }
}

impl InterceptorManager<dyn ResponseHandler, dyn ErrorHandler> {
    /// Register a success handler only
    pub fn on_response(&self, handler: impl ResponseHandler + 'static) -> u64 {
        self.add(Some(Arc::new(handler)), None)
    }

    /// Register an error handler only
    pub fn on_error(&self, handler: impl ErrorHandler + 'static) -> u64 {
        self.add(None, Some(Arc::new(handler)))
    }

    /// Register a success handler and an error handler
    pub fn on_response_or_error(
        &self,
        handler: impl ResponseHandler + 'static,
        on_error: impl ErrorHandler + 'static,
    ) -> u64 {
        self.add(Some(Arc::new(handler)), Some(Arc::new(on_error)))
    }

    /// Thread `response` through every success handler in order
    pub async fn run(&self, mut response: HttpResponse) -> Result<HttpResponse> {
        for item in self.get_all() {
            if let Some(handler) = item.on_fulfilled.as_ref() {
                let config = response.config.clone();
                response = guarded(handler.on_response(response))
                    .await
                    .map_err(|e| e.or_config(&config))?;
            }
        }
        Ok(response)
    }

    /// Hand `error` to every registered error handler in order
    pub async fn notify_error(&self, error: &HttpError) {
        notify(&self.get_all(), error).await;
    }
}
