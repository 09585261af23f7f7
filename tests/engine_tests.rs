//! End-to-end tests through the engine: raw HTTP in, chain dispatch with
//! suspension, response out.

mod common;

use chainline::runtime_config::RuntimeConfig;
use chainline::server::{AppService, Engine, EngineConfig, RouteTable, ServerHandle};
use chainline::{ActionChain, ActionMeta, ActionRegistry, LeafAction};
use http::Method;
use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Test fixture with automatic teardown: stops the engine when the test
/// completes, even on panic.
struct TestServer {
    handle: Option<ServerHandle>,
    addr: SocketAddr,
}

impl TestServer {
    fn start() -> Self {
        common::runtime::init();

        let mut registry = ActionRegistry::new();

        let load_user = registry.register(LeafAction::shared(
            ActionMeta::new("load", "user").with_captures(1),
            |ctx| {
                let id = ctx.args().first().cloned().unwrap_or_default();
                ctx.stash.insert("user_id".to_string(), Value::String(id));
                true
            },
        ));

        let show_user = registry.register(LeafAction::shared(
            ActionMeta::new("show", "user"),
            |ctx| {
                let user = ctx.stash.get("user_id").cloned().unwrap_or(Value::Null);
                let args = ctx.args().to_vec();
                let body = json!({ "user": user, "args": args });
                ctx.response.json(200, body);
                true
            },
        ));

        let fetch_async = registry.register(LeafAction::shared(
            ActionMeta::new("fetch", "report"),
            |ctx| {
                let handle = ctx.detach();
                may::go!(move || {
                    may::coroutine::sleep(Duration::from_millis(20));
                    handle.complete();
                });
                true
            },
        ));

        let boom = registry.register(LeafAction::shared(ActionMeta::new("boom", ""), |_| false));

        // an operation that will never finish; its timeout collaborator
        // aborts the request instead
        let stuck = registry.register(LeafAction::shared(
            ActionMeta::new("stuck", "report"),
            |ctx| {
                let handle = ctx.detach();
                may::go!(move || {
                    may::coroutine::sleep(Duration::from_millis(20));
                    handle.abort();
                });
                true
            },
        ));

        let mut routes = RouteTable::new();
        routes.add(
            Method::GET,
            "/user/{id}/show/...",
            ActionChain::new(vec![Arc::clone(&load_user), Arc::clone(&show_user)]).unwrap(),
        );
        routes.add(
            Method::GET,
            "/user/{id}/report",
            ActionChain::new(vec![load_user, fetch_async, Arc::clone(&show_user)]).unwrap(),
        );
        routes.add(
            Method::GET,
            "/boom",
            ActionChain::new(vec![boom]).unwrap(),
        );
        routes.add(
            Method::GET,
            "/stuck",
            ActionChain::new(vec![stuck, show_user]).unwrap(),
        );

        let service = AppService::new(
            Arc::new(RwLock::new(routes)),
            Arc::new(registry),
            url::Url::parse("http://localhost:8080/").unwrap(),
        );

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let handle = Engine::new(EngineConfig {
            addr: addr.to_string(),
            runtime: RuntimeConfig::default(),
        })
        .start(service)
        .unwrap();
        handle.wait_ready().unwrap();

        TestServer {
            handle: Some(handle),
            addr,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[test]
fn health_endpoint_responds() {
    let server = TestServer::start();
    let (status, body) = common::http::get(&server.addr, "/health");
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[test]
fn chain_round_trip_with_captures_and_trailing_args() {
    let server = TestServer::start();
    let (status, body) = common::http::get(&server.addr, "/user/42/show/extra/bits");
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "user": "42", "args": ["extra", "bits"] }));
}

#[test]
fn suspended_request_completes_after_async_work() {
    let server = TestServer::start();
    let (status, body) = common::http::get(&server.addr, "/user/7/report");
    assert_eq!(status, 200);
    // the final link ran after resumption with the original (empty)
    // trailing arguments
    assert_eq!(body, json!({ "user": "7", "args": [] }));
}

#[test]
fn unmatched_path_is_not_found() {
    let server = TestServer::start();
    let (status, body) = common::http::get(&server.addr, "/nope");
    assert_eq!(status, 404);
    assert_eq!(body["error"], json!("Not Found"));
}

#[test]
fn link_failure_maps_to_server_error() {
    let server = TestServer::start();
    let (status, body) = common::http::get(&server.addr, "/boom");
    assert_eq!(status, 500);
    assert_eq!(body["error"], json!("Dispatch failed"));
}

#[test]
fn aborted_request_fails_instead_of_hanging() {
    let server = TestServer::start();
    let (status, body) = common::http::get(&server.addr, "/stuck");
    assert_eq!(status, 500);
    assert_eq!(body["error"], json!("Dispatch failed"));
}

#[test]
fn stats_reflect_dispatch_outcomes() {
    let server = TestServer::start();
    let _ = common::http::get(&server.addr, "/user/1/show");
    let _ = common::http::get(&server.addr, "/user/2/report");
    let _ = common::http::get(&server.addr, "/boom");

    let (status, body) = common::http::get(&server.addr, "/stats");
    assert_eq!(status, 200);
    assert_eq!(body["dispatched"], json!(3));
    assert_eq!(body["completed"], json!(2));
    assert_eq!(body["failed"], json!(1));
    assert_eq!(body["suspended"], json!(1));
    assert_eq!(body["resumed"], json!(1));
}

#[test]
fn actions_endpoint_lists_registered_reverse_paths() {
    let server = TestServer::start();
    let (status, body) = common::http::get(&server.addr, "/actions");
    assert_eq!(status, 200);
    assert_eq!(
        body["actions"],
        json!(["boom", "report/fetch", "report/stuck", "user/load", "user/show"])
    );
}
