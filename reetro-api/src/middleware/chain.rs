//! Middleware composition.
//!
//! A [`Middleware`] receives the request and the rest of the chain as an
//! [`Endpoint`]. It either answers directly (short-circuit) or delegates by
//! calling `next`. [`MiddlewareChain::then`] folds the listed middlewares
//! around a final endpoint so that the first-listed one runs first:
//! `[m1, m2, m3].then(h)` behaves as `m1(m2(m3(h)))`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::handler::Handler;
use axum::response::Response;

pub type BoxResponseFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

type EndpointFn = dyn Fn(Request) -> BoxResponseFuture + Send + Sync;

/// A type-erased request handler. Cloning shares the underlying function.
#[derive(Clone)]
pub struct Endpoint(Arc<EndpointFn>);

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Endpoint")
    }
}

impl Endpoint {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self(Arc::new(move |req| -> BoxResponseFuture { Box::pin(f(req)) }))
    }

    /// Wrap an axum handler together with the state it extracts from.
    pub fn from_axum<H, T, S>(handler: H, state: S) -> Self
    where
        H: Handler<T, S> + Sync,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        Self(Arc::new(move |req| -> BoxResponseFuture {
            Box::pin(handler.clone().call(req, state.clone()))
        }))
    }

    pub async fn call(&self, req: Request) -> Response {
        (self.0)(req).await
    }

    /// Convert back into something axum can route to.
    pub fn into_axum(
        self,
    ) -> impl Fn(Request) -> BoxResponseFuture + Clone + Send + Sync + 'static {
        move |req| (self.0)(req)
    }
}

/// One request interceptor in a [`MiddlewareChain`].
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Handle `req`, delegating to `next` to continue down the chain.
    async fn handle(&self, req: Request, next: Endpoint) -> Response;

    fn name(&self) -> &'static str;
}

/// An ordered list of middlewares, applied first-to-last.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.layers.iter().map(|m| m.name()))
            .finish()
    }
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware. It runs after every middleware already listed.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Wrap `endpoint` in every middleware of the chain.
    pub fn then(&self, endpoint: Endpoint) -> Endpoint {
        self.layers.iter().rev().fold(endpoint, |next, layer| {
            let layer = Arc::clone(layer);
            Endpoint::new(move |req| {
                let layer = Arc::clone(&layer);
                let next = next.clone();
                async move { layer.handle(req, next).await }
            })
        })
    }
}
