// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Protection middleware
//!
//! Puts a [`Client`] in front of an axum/tower service:
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use datadome_protection::Client;
//!
//! let client = Client::new("server-side-key").unwrap();
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .layer(client.layer());
//! ```
//!
//! Blocked requests are answered with the Protection API's response and never
//! reach the wrapped service. Everything else is forwarded, carrying the
//! request headers nominated by the Protection API, and the nominated response
//! headers are merged into the wrapped service's response.
//!
//! # Architecture
//!
//! - **Layer:** Presentation Layer
//! - **Purpose:** tower `Layer`/`Service` and axum `from_fn` surfaces

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http;
use axum::middleware::Next;
use axum::response::Response;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::client::Client;
use crate::infrastructure::response_writer::ResponseWriter;

/// Run the protection for `request`. `Err` carries the block response.
async fn guard(client: &Client, request: &mut http::Request<Body>) -> Result<ResponseWriter, Response> {
    let mut writer = ResponseWriter::new();
    match client.protect(&mut writer, request).await {
        Ok(true) => Err(writer.into_response()),
        // Errors were logged by the client; fail open.
        Ok(false) | Err(_) => Ok(writer),
    }
}

#[derive(Clone)]
pub struct ProtectionLayer {
    client: Arc<Client>,
}

impl ProtectionLayer {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

impl fmt::Debug for ProtectionLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectionLayer")
            .field("client", &self.client)
            .finish()
    }
}

impl<S> Layer<S> for ProtectionLayer {
    type Service = ProtectionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ProtectionService {
            inner,
            client: self.client.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ProtectionService<S> {
    inner: S,
    client: Arc<Client>,
}

impl<S> Service<http::Request<Body>> for ProtectionService<S>
where
    S: Service<http::Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: http::Request<Body>) -> Self::Future {
        // Keep the service that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let client = self.client.clone();

        Box::pin(async move {
            let writer = match guard(&client, &mut request).await {
                Ok(writer) => writer,
                Err(blocked) => return Ok(blocked),
            };

            let mut response = inner.call(request).await?;
            writer.merge_into(&mut response);
            Ok(response)
        })
    }
}

/// Function form for `axum::middleware::from_fn_with_state`.
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use datadome_protection::{protection_middleware, Client};
/// use std::sync::Arc;
///
/// let client = Arc::new(Client::new("server-side-key").unwrap());
/// let app: Router = Router::new()
///     .route("/", get(|| async { "hello" }))
///     .layer(middleware::from_fn_with_state(client, protection_middleware));
/// ```
pub async fn protection_middleware(
    State(client): State<Arc<Client>>,
    mut request: Request,
    next: Next,
) -> Response {
    let writer = match guard(&client, &mut request).await {
        Ok(writer) => writer,
        Err(blocked) => return blocked,
    };

    let mut response = next.run(request).await;
    writer.merge_into(&mut response);
    response
}
