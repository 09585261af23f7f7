//! Environment variable based tuning for the coroutine runtime.
//!
//! ## Environment Variables
//!
//! - `CHAINLINE_STACK_SIZE` — stack size in bytes for request coroutines.
//!   Accepts decimal (`16384`) or hexadecimal (`0x4000`). Default: `0x4000`.
//! - `CHAINLINE_WORKERS` — number of scheduler worker threads. Each worker
//!   runs its own cooperative event loop; requests never migrate state
//!   between them mid-dispatch. Default: `2`.
//!
//! Stack size matters here more than in a thread-per-request server: every
//! parked request (a chain suspended on an async detach) holds its stack
//! until resumed, so total memory is `stack_size × concurrent_suspended`.

use std::env;

/// Runtime configuration loaded from environment variables.
///
/// Load this at startup using [`RuntimeConfig::from_env()`] before the may
/// scheduler is touched.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for request coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
    /// Scheduler worker threads (default: 2)
    pub workers: usize,
}

fn parse_size(val: &str) -> Option<usize> {
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let stack_size = env::var("CHAINLINE_STACK_SIZE")
            .ok()
            .and_then(|v| parse_size(&v))
            .unwrap_or(0x4000);
        let workers = env::var("CHAINLINE_WORKERS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2);
        RuntimeConfig {
            stack_size,
            workers,
        }
    }

    /// Apply this configuration to the global may scheduler.
    ///
    /// Must run before any coroutine is spawned; may reads these values at
    /// scheduler initialization.
    pub fn apply(&self) {
        may::config()
            .set_stack_size(self.stack_size)
            .set_workers(self.workers);
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            stack_size: 0x4000,
            workers: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_decimal() {
        assert_eq!(parse_size("0x4000"), Some(0x4000));
        assert_eq!(parse_size("16384"), Some(16384));
        assert_eq!(parse_size("banana"), None);
    }
}
