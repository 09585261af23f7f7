use chainline::runtime_config::RuntimeConfig;
use chainline::server::{run_until_shutdown, AppService, Engine, EngineConfig, RouteTable};
use chainline::{ActionChain, ActionMeta, ActionRegistry, LeafAction};
use clap::Parser;
use http::Method;
use serde_json::{json, Value};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Chainline demo server: a small chained-action application showing
/// capture distribution, the stash, and async detach/resume.
#[derive(Parser)]
#[command(name = "chainline", about = "Chainline demo server", long_about = None)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0:8080")]
    addr: String,

    /// Scheduler worker threads (overrides CHAINLINE_WORKERS)
    #[arg(long)]
    workers: Option<usize>,

    /// Public base URL used for generated URIs
    #[arg(long, default_value = "http://localhost:8080/")]
    base_uri: String,
}

fn build_app() -> anyhow::Result<(ActionRegistry, RouteTable)> {
    let mut registry = ActionRegistry::new();

    // Intermediate link: destructures the {id} capture into the stash.
    let load_user = registry.register(LeafAction::shared(
        ActionMeta::new("load", "user")
            .with_captures(1)
            .with_controller("User"),
        |ctx| {
            let id = ctx.args().first().cloned().unwrap_or_default();
            ctx.stash.insert("user_id".to_string(), Value::String(id));
            true
        },
    ));

    // Final link: renders whatever earlier links stashed.
    let show_user = registry.register(LeafAction::shared(
        ActionMeta::new("show", "user").with_controller("User"),
        |ctx| {
            let user_id = ctx.stash.get("user_id").cloned().unwrap_or(Value::Null);
            let id_text = user_id.as_str().unwrap_or("").to_string();
            let trailing = ctx.args().to_vec();
            let link = ctx.uri_for("/user", &[id_text, "show".to_string()], &[]);
            let body = json!({ "user": user_id, "args": trailing, "self": link.as_str() });
            ctx.response.json(200, body);
            true
        },
    ));

    // Detaching link: kicks off async work and lets the chain suspend
    // until the completion arrives from another coroutine.
    let fetch_report = registry.register(LeafAction::shared(
        ActionMeta::new("fetch", "report").with_controller("Report"),
        |ctx| {
            let handle = ctx.detach();
            may::go!(move || {
                may::coroutine::sleep(Duration::from_millis(25));
                handle.complete();
            });
            ctx.stash
                .insert("report".to_string(), json!({ "status": "generated" }));
            true
        },
    ));

    let render_report = registry.register(LeafAction::shared(
        ActionMeta::new("render", "report").with_controller("Report"),
        |ctx| {
            let user_id = ctx.stash.get("user_id").cloned().unwrap_or(Value::Null);
            let report = ctx.stash.get("report").cloned().unwrap_or(Value::Null);
            let body = json!({ "user": user_id, "report": report });
            ctx.response.json(200, body);
            true
        },
    ));

    let mut routes = RouteTable::new();
    routes.add(
        Method::GET,
        "/user/{id}/show/...",
        ActionChain::new(vec![Arc::clone(&load_user), show_user])?,
    );
    routes.add(
        Method::GET,
        "/user/{id}/report",
        ActionChain::new(vec![load_user, fetch_report, render_report])?,
    );

    Ok((registry, routes))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut runtime = RuntimeConfig::from_env();
    if let Some(workers) = cli.workers {
        runtime.workers = workers;
    }

    let base_uri = url::Url::parse(&cli.base_uri)?;
    let (registry, routes) = build_app()?;
    let service = AppService::new(
        Arc::new(RwLock::new(routes)),
        Arc::new(registry),
        base_uri,
    );

    let engine = Engine::new(EngineConfig {
        addr: cli.addr.clone(),
        runtime,
    })
    .on_worker_start(|worker_id| info!(worker_id, "Worker online"));

    let handle = engine.start(service)?;
    handle.wait_ready()?;
    info!(addr = %cli.addr, "chainline listening");

    run_until_shutdown(handle)?;
    Ok(())
}
