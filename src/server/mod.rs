//! # Server Module
//!
//! The process/engine adapter around the dispatch core. It owns the thin
//! glue the core treats as external collaborators:
//!
//! - [`RouteTable`] — maps method + path to a chain, producing the ordered
//!   capture list and trailing arguments the chain consumes. A stand-in
//!   for a full router; pattern matching is deliberately small.
//! - [`AppService`] — the `may_minihttp` service: parse, route, drive a
//!   [`RequestSlot`](crate::dispatcher::RequestSlot) to a terminal
//!   outcome, write the response.
//! - [`Engine`] — configures the coroutine runtime, runs worker startup
//!   hooks, starts the HTTP server, and supports graceful shutdown on
//!   SIGTERM/SIGINT.
//!
//! Each worker thread runs its own cooperative scheduler; concurrency
//! across requests comes from interleaving parked coroutines on that
//! scheduler, never from parallel execution of one request's chain.

mod engine;
mod response;
mod routes;
mod service;

pub use engine::{run_until_shutdown, Engine, EngineConfig, ServerHandle};
pub use response::{write_json, write_json_error, write_response};
pub use routes::{RouteTable, RoutedRequest};
pub use service::{health_endpoint, AppService};
