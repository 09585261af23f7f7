use crate::runtime_config::RuntimeConfig;
use may::coroutine::JoinHandle;
use may_minihttp::{HttpServer, HttpService};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

/// Engine startup configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Address to bind (e.g. `0.0.0.0:8080`)
    pub addr: String,
    /// Coroutine runtime tuning
    pub runtime: RuntimeConfig,
}

type WorkerHook = Box<dyn Fn(usize) + Send + Sync>;

/// Process-level wrapper that turns an [`AppService`](super::AppService)
/// into a running server: applies the runtime configuration, runs worker
/// startup hooks, and binds the HTTP listener.
pub struct Engine {
    config: EngineConfig,
    on_worker_start: Option<WorkerHook>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            on_worker_start: None,
        }
    }

    /// Register a hook invoked once per scheduler worker before the
    /// listener starts accepting connections (the post-fork analog of
    /// host-server plugins). Receives the worker index.
    #[must_use]
    pub fn on_worker_start<F>(mut self, hook: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.on_worker_start = Some(Box::new(hook));
        self
    }

    /// Apply the runtime config and start serving.
    ///
    /// Must be called before any coroutine is spawned; may reads stack
    /// size and worker count at scheduler initialization.
    pub fn start<T>(self, service: T) -> io::Result<ServerHandle>
    where
        T: HttpService + Clone + Send + Sync + 'static,
    {
        self.config.runtime.apply();

        if let Some(hook) = &self.on_worker_start {
            for worker_id in 0..self.config.runtime.workers {
                hook(worker_id);
            }
        }

        let addr = self
            .config
            .addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;

        info!(
            addr = %addr,
            workers = self.config.runtime.workers,
            stack_size = self.config.runtime.stack_size,
            "Engine starting"
        );

        let handle = HttpServer(service).start(addr)?;
        Ok(ServerHandle { addr, handle })
    }
}

/// Handle to a running engine.
///
/// Supports readiness polling for tests, graceful stop, and joining the
/// listener coroutine.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the listener is bound to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the listener accepts a TCP connection, backing off
    /// between attempts.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the listener never starts accepting within
    /// one second.
    pub fn wait_ready(&self) -> io::Result<()> {
        let deadline = Instant::now() + Duration::from_secs(1);
        let mut pause = Duration::from_millis(2);
        loop {
            if TcpStream::connect_timeout(&self.addr, Duration::from_millis(50)).is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("listener on {} never started accepting", self.addr),
                ));
            }
            thread::sleep(pause);
            pause = (pause * 2).min(Duration::from_millis(50));
        }
    }

    /// Stop the engine.
    ///
    /// The listener coroutine blocks in accept and has no shutdown
    /// channel; stopping it means cancelling the coroutine and joining.
    pub fn stop(self) {
        // SAFETY: the handle is consumed here, so nothing can observe the
        // coroutine after cancellation; the listener unwinds at its next
        // scheduler yield.
        unsafe { self.handle.coroutine().cancel() };
        self.handle.join().ok();
    }

    /// Block until the listener coroutine finishes.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

/// Serve until a shutdown signal arrives, then stop the engine.
///
/// Listens for SIGTERM and SIGINT (Kubernetes scale-down, rollouts,
/// Ctrl-C) and performs a graceful stop when the first one arrives.
#[cfg(unix)]
pub fn run_until_shutdown(handle: ServerHandle) -> io::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGTERM, SIGINT])?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    handle.stop();
    Ok(())
}

/// Serve until the listener coroutine finishes.
#[cfg(not(unix))]
pub fn run_until_shutdown(handle: ServerHandle) -> io::Result<()> {
    handle
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "server coroutine panicked"))
}
