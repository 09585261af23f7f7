//! # Chainline
//!
//! **Chainline** is a coroutine-powered chained-action dispatch engine for
//! Rust, built on the `may` runtime. Routing (external to this crate's
//! core) matches a request to an ordered list of actions plus a list of
//! path captures; chainline executes that list as one composite
//! [`ActionChain`], distributing captures among the intermediate links,
//! handing the final link the request's trailing arguments, and — the hard
//! part — suspending cleanly when a link detaches into asynchronous work
//! and resuming later at the exact link where it stopped.
//!
//! ## Architecture
//!
//! - **[`action`]** - the `Action` contract, leaf actions, and the
//!   startup-time registry
//! - **[`chain`]** - `ActionChain`: ordered composite execution with
//!   capture distribution and suspend/resume
//! - **[`context`]** - per-request shared state: capture buffer, argument
//!   list, response, stash, and the dispatch cursor
//! - **[`dispatcher`]** - the dispatch protocol (`begin` / `resume`) and
//!   the engine request slot that parks suspended requests
//! - **[`server`]** - process adapter: route table, `may_minihttp`
//!   service, engine lifecycle, graceful shutdown
//! - **[`templating`]** - `uri_for` for minijinja templates
//!
//! ## Execution model
//!
//! One cooperative scheduler per worker thread. A request is driven start
//! to finish on its own coroutine; when its chain suspends, that coroutine
//! parks on a channel and the scheduler runs other requests. Asynchronous
//! completions re-enter the parked chain through the request slot — never
//! concurrently with other work on the same request. Completed links are
//! never re-run; captures are consumed strictly left to right.
//!
//! ## Quick start
//!
//! ```no_run
//! use chainline::{ActionChain, ActionMeta, ActionRegistry, LeafAction};
//! use chainline::server::{AppService, Engine, EngineConfig, RouteTable};
//! use chainline::runtime_config::RuntimeConfig;
//! use http::Method;
//! use std::sync::{Arc, RwLock};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut registry = ActionRegistry::new();
//! let load = registry.register(LeafAction::shared(
//!     ActionMeta::new("load", "user").with_captures(1),
//!     |_ctx| true,
//! ));
//! let show = registry.register(LeafAction::shared(
//!     ActionMeta::new("show", "user"),
//!     |ctx| { ctx.response.json(200, serde_json::json!({"ok": true})); true },
//! ));
//! let chain = ActionChain::new(vec![load, show])?;
//!
//! let mut routes = RouteTable::new();
//! routes.add(Method::GET, "/user/{id}/show", chain);
//!
//! let service = AppService::new(
//!     Arc::new(RwLock::new(routes)),
//!     Arc::new(registry),
//!     url::Url::parse("http://localhost:8080/")?,
//! );
//! let handle = Engine::new(EngineConfig {
//!     addr: "0.0.0.0:8080".into(),
//!     runtime: RuntimeConfig::from_env(),
//! })
//! .start(service)?;
//! handle.join().ok();
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod chain;
pub mod context;
pub mod dispatcher;
pub mod ids;
pub mod runtime_config;
pub mod server;
pub mod templating;

pub use action::{Action, ActionMeta, ActionRegistry, LeafAction};
pub use chain::{ActionChain, ChainError};
pub use context::{ArgVec, DetachHandle, DispatchCursor, RequestContext, ResumeEvent};
pub use dispatcher::{
    begin_dispatch, on_async_complete, resume_dispatch, DispatchOutcome, RequestSlot,
};
