//! HTTP status endpoint
//!
//! A small hyper server exposing the aggregate verdict. `GET` always
//! answers `200` with the verdict text as the body; `HEAD` is the
//! machine-readable variant, answering `200` or `503`. Only the configured
//! location is served.

use hyper::header::{HeaderValue, ALLOW, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, StatusCode};
use rscheck_core::{Aggregator, QueryArgs};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{DaemonError, Result};

/// What one `http_server` thread needs to answer requests
pub struct ServerContext {
    /// Aggregator shared with the check runners
    pub aggregator: Arc<Aggregator>,
    /// Path served by this endpoint
    pub location: String,
    /// Whether connections stay open between requests
    pub keep_alive: bool,
}

/// Bind the listener and return the serving future
///
/// Binding happens eagerly so that port clashes are startup failures; the
/// returned future runs the accept loop until process teardown.
pub fn serve(
    ctx: Arc<ServerContext>,
    addr: SocketAddr,
) -> Result<impl std::future::Future<Output = Result<()>>> {
    let keep_alive = ctx.keep_alive;
    let make_svc = make_service_fn(move |_conn| {
        let ctx = Arc::clone(&ctx);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let ctx = Arc::clone(&ctx);
                async move { Ok::<_, Infallible>(handle(ctx, req).await) }
            }))
        }
    });

    let builder = hyper::Server::try_bind(&addr)
        .map_err(|e| DaemonError::ServerError(format!("failed to bind {}: {}", addr, e)))?
        .http1_keepalive(keep_alive);
    info!("status endpoint listening on {}", addr);
    Ok(async move {
        builder
            .serve(make_svc)
            .await
            .map_err(|e| DaemonError::ServerError(e.to_string()))
    })
}

/// Answer one request
pub async fn handle(ctx: Arc<ServerContext>, req: Request<Body>) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let raw_query = req.uri().query().unwrap_or("").to_string();

    let response = route(&ctx, &method, &path, &raw_query).await;
    debug!(
        "{} {} -> {}",
        method,
        req.uri(),
        response.status().as_u16()
    );
    finalize(&ctx, response)
}

async fn route(
    ctx: &ServerContext,
    method: &Method,
    path: &str,
    raw_query: &str,
) -> Response<Body> {
    if path != ctx.location {
        return plain_response(StatusCode::NOT_FOUND, "not found\n");
    }
    if method != Method::GET && method != Method::HEAD {
        let mut response = plain_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed\n");
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
        return response;
    }

    let args = match QueryArgs::parse(raw_query) {
        Ok(args) => args,
        Err(_) => return plain_response(StatusCode::BAD_REQUEST, "bad request\n"),
    };

    let query_key = if args.is_empty() { "" } else { raw_query };
    if !args.is_empty() {
        ctx.aggregator.run_query(query_key, &args).await;
    }
    let exclude = args.exclude();

    if method == Method::HEAD {
        let status = if ctx.aggregator.all_healthy(query_key, &exclude) {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        let mut response = Response::new(Body::empty());
        *response.status_mut() = status;
        if ctx.keep_alive {
            response
                .headers_mut()
                .insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
        }
        return response;
    }

    // GET reports health in the body, not the status line.
    let (_status, message) = ctx.aggregator.snapshot(query_key, &exclude);
    plain_response(StatusCode::OK, message)
}

fn plain_response(status: StatusCode, body: impl Into<String>) -> Response<Body> {
    let mut response = Response::new(Body::from(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

fn finalize(ctx: &ServerContext, mut response: Response<Body>) -> Response<Body> {
    let server = format!("RSCheck/{}", env!("CARGO_PKG_VERSION"));
    if let Ok(value) = HeaderValue::from_str(&server) {
        response.headers_mut().insert(SERVER, value);
    }
    if !ctx.keep_alive {
        response
            .headers_mut()
            .insert(CONNECTION, HeaderValue::from_static("close"));
    }
    response
}
