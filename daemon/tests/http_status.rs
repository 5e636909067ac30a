#![allow(unused_crate_dependencies)]
//! End-to-end scenarios for the status endpoint over a real socket

use daemon::server::{handle, ServerContext};
use hyper::header::{CONNECTION, CONTENT_LENGTH, SERVER};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Client, Method, Request, StatusCode};
use rscheck_core::{Aggregator, Outcome, QueryCache, QuerySettings, ResultStore};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task;

fn context(names: &[&str], keep_alive: bool) -> Arc<ServerContext> {
    let store = Arc::new(ResultStore::new(names.iter().map(|n| n.to_string())));
    let aggregator = Arc::new(Aggregator::new(
        store,
        Arc::new(QueryCache::new()),
        QuerySettings::default(),
    ));
    Arc::new(ServerContext {
        aggregator,
        location: "/getstatus".to_string(),
        keep_alive,
    })
}

async fn start_server(ctx: Arc<ServerContext>) -> SocketAddr {
    let make_svc = make_service_fn(move |_conn| {
        let ctx = Arc::clone(&ctx);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let ctx = Arc::clone(&ctx);
                async move { Ok::<_, Infallible>(handle(ctx, req).await) }
            }))
        }
    });
    let addr = ([127, 0, 0, 1], 0).into();
    let server = hyper::Server::bind(&addr).serve(make_svc);
    let addr = server.local_addr();
    task::spawn(async move {
        if let Err(e) = server.await {
            eprintln!("test server error: {}", e);
        }
    });
    addr
}

async fn get_body(addr: SocketAddr, path_and_query: &str) -> (StatusCode, String) {
    let client = Client::new();
    let uri = format!("http://{}{}", addr, path_and_query).parse().unwrap();
    let response = client.get(uri).await.expect("request should succeed");
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

async fn head(addr: SocketAddr, path_and_query: &str) -> hyper::Response<Body> {
    let client = Client::new();
    let req = Request::builder()
        .method(Method::HEAD)
        .uri(format!("http://{}{}", addr, path_and_query))
        .body(Body::empty())
        .unwrap();
    client.request(req).await.expect("request should succeed")
}

#[tokio::test]
async fn scenario_all_checks_ok() {
    let ctx = context(&["c1", "c2"], true);
    let addr = start_server(Arc::clone(&ctx)).await;

    let response = head(addr, "/getstatus").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_LENGTH], "0");

    let (status, body) = get_body(addr, "/getstatus").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "true");
}

#[tokio::test]
async fn scenario_one_check_failing() {
    let ctx = context(&["c1", "c2"], true);
    ctx.aggregator
        .store()
        .update("c2", Outcome::error("c2 error: boom"));
    let addr = start_server(Arc::clone(&ctx)).await;

    let response = head(addr, "/getstatus").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = get_body(addr, "/getstatus").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "c2 error: boom");
}

#[tokio::test]
async fn scenario_status_message_surfaces_when_healthy() {
    let ctx = context(&["c1", "c2"], true);
    ctx.aggregator
        .store()
        .update("c1", Outcome::ok("gw=10.0.0.1"));
    let addr = start_server(ctx).await;

    let (status, body) = get_body(addr, "/getstatus").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "gw=10.0.0.1");
}

#[tokio::test]
async fn scenario_exclude_masks_the_failure() {
    let ctx = context(&["c1", "c2"], true);
    ctx.aggregator
        .store()
        .update("c2", Outcome::error("c2 error: boom"));
    let addr = start_server(ctx).await;

    let (status, body) = get_body(addr, "/getstatus?exclude=c2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "true");

    let response = head(addr, "/getstatus?exclude=c2").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn scenario_unknown_path_and_malformed_query() {
    let ctx = context(&["c1"], true);
    let addr = start_server(ctx).await;

    let (status, _) = get_body(addr, "/other").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_body(addr, "/getstatus?malformed").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn virtual_if_query_failure_shows_up_on_both_verbs() {
    // A nonexistent interface stands in for scenario 5's rp_filter case;
    // both depend only on the query outcome flowing into the verdict.
    let ctx = context(&["c1"], true);
    let addr = start_server(ctx).await;
    let query = "/getstatus?virtual_if=rscheck-no-such-if0&virtual_ip=192.0.2.9";

    let (status, body) = get_body(addr, query).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("does not exist"), "body was: {body}");

    let response = head(addr, query).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn headers_reflect_keep_alive_setting() {
    let ctx = context(&["c1"], true);
    let addr = start_server(ctx).await;
    let client = Client::new();
    let response = client
        .get(format!("http://{}/getstatus", addr).parse().unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key(CONTENT_LENGTH));
    assert!(response.headers()[SERVER]
        .to_str()
        .unwrap()
        .starts_with("RSCheck/"));

    let ctx = context(&["c1"], false);
    let addr = start_server(ctx).await;
    let response = client
        .get(format!("http://{}/getstatus", addr).parse().unwrap())
        .await
        .unwrap();
    assert_eq!(response.headers()[CONNECTION], "close");
}

#[tokio::test]
async fn repeated_queries_hit_the_cache() {
    let ctx = context(&["c1"], true);
    let addr = start_server(Arc::clone(&ctx)).await;

    let (_, first) = get_body(addr, "/getstatus?bogus=1").await;
    assert!(first.contains("invalid check"));
    assert_eq!(ctx.aggregator.cache().len(), 1);

    let (_, second) = get_body(addr, "/getstatus?bogus=1").await;
    assert_eq!(first, second);
    assert_eq!(ctx.aggregator.cache().len(), 1);
}
