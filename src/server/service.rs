use super::response::{write_json, write_json_error, write_response};
use super::routes::RouteTable;
use crate::action::ActionRegistry;
use crate::dispatcher::{DispatchMetrics, DispatchOutcome, RequestSlot};
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Application-lifetime state shared by every worker: the route table, the
/// action registry, dispatch counters, and the public base URL used for
/// URI generation.
///
/// Constructed once at startup and cloned per connection; all fields are
/// shared handles, so clones are cheap and see the same state.
#[derive(Clone)]
pub struct AppService {
    pub routes: Arc<RwLock<RouteTable>>,
    pub registry: Arc<ActionRegistry>,
    pub metrics: Arc<DispatchMetrics>,
    pub base_uri: url::Url,
}

impl AppService {
    pub fn new(
        routes: Arc<RwLock<RouteTable>>,
        registry: Arc<ActionRegistry>,
        base_uri: url::Url,
    ) -> Self {
        AppService {
            routes,
            registry,
            metrics: Arc::new(DispatchMetrics::new()),
            base_uri,
        }
    }
}

/// Basic health check endpoint returning `{ "status": "ok" }`.
pub fn health_endpoint(res: &mut Response) -> io::Result<()> {
    write_json(res, 200, json!({ "status": "ok" }));
    Ok(())
}

/// Dispatch counters as JSON.
pub fn stats_endpoint(res: &mut Response, metrics: &DispatchMetrics) -> io::Result<()> {
    let snapshot = metrics.snapshot();
    write_json(
        res,
        200,
        serde_json::to_value(snapshot).unwrap_or_else(|_| json!({})),
    );
    Ok(())
}

/// Reverse paths of every registered action, for startup debugging.
pub fn actions_endpoint(res: &mut Response, registry: &ActionRegistry) -> io::Result<()> {
    write_json(res, 200, json!({ "actions": registry.reverse_paths() }));
    Ok(())
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let method_str = req.method().to_string();
        let raw_path = req.path().to_string();
        let path = raw_path.split('?').next().unwrap_or("/").to_string();

        let method = match method_str.parse::<Method>() {
            Ok(method) => method,
            Err(_) => {
                write_json_error(res, 400, json!({ "error": "Unsupported method" }));
                return Ok(());
            }
        };

        if method == Method::GET && path == "/health" {
            return health_endpoint(res);
        }
        if method == Method::GET && path == "/stats" {
            return stats_endpoint(res, &self.metrics);
        }
        if method == Method::GET && path == "/actions" {
            return actions_endpoint(res, &self.registry);
        }

        let routed = {
            let table = self.routes.read().unwrap();
            table.route(&method, &path)
        };
        let routed = match routed {
            Some(routed) => routed,
            None => {
                write_json_error(
                    res,
                    404,
                    json!({ "error": "Not Found", "method": method_str, "path": path }),
                );
                return Ok(());
            }
        };

        let slot = RequestSlot::with_metrics(Arc::clone(&self.metrics));
        let capture_count = routed.captures.len();
        let mut ctx = slot.context(
            method,
            path.clone(),
            routed.captures,
            routed.args,
            self.base_uri.clone(),
        );

        info!(
            request_id = %ctx.request_id,
            method = %method_str,
            path = %path,
            captures = capture_count,
            "Request entered dispatch"
        );

        match slot.run(&routed.chain, &mut ctx) {
            DispatchOutcome::Completed { success: true } => write_response(res, &ctx.response),
            _ => write_json_error(
                res,
                500,
                json!({ "error": "Dispatch failed", "method": method_str, "path": path }),
            ),
        }
        Ok(())
    }
}
