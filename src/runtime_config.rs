//! # Runtime Configuration Module
//!
//! Environment variable-based tuning of the coroutine runtime.
//!
//! ## Environment Variables
//!
//! ### `SERVLET_STACK_SIZE`
//!
//! Stack size for connection coroutines. Accepts values in:
//! - Decimal: `65536` (64 KB)
//! - Hexadecimal: `0x10000` (64 KB)
//!
//! Default: `0x10000` (64 KB)
//!
//! Each connection runs framing, location and the servlet on its own
//! coroutine, so the stack must hold the deepest servlet call chain.
//!
//! ### `SERVLET_WORKERS`
//!
//! Number of OS worker threads driving coroutines. Default: number of CPUs.
//!
//! ## Usage
//!
//! ```rust
//! use servlet_engine::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;

/// Default coroutine stack size (64 KB)
pub const DEFAULT_STACK_SIZE: usize = 0x10000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for connection coroutines in bytes
    pub stack_size: usize,
    /// Worker threads for the coroutine scheduler (`None` keeps the runtime default)
    pub workers: Option<usize>,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = env::var("SERVLET_STACK_SIZE")
            .ok()
            .and_then(|val| parse_size(&val))
            .unwrap_or(DEFAULT_STACK_SIZE);
        let workers = env::var("SERVLET_WORKERS")
            .ok()
            .and_then(|val| val.parse().ok())
            .filter(|n: &usize| *n > 0);
        RuntimeConfig {
            stack_size,
            workers,
        }
    }

    /// Apply the settings to the global `may` scheduler.
    pub fn apply(&self) {
        let cfg = may::config();
        cfg.set_stack_size(self.stack_size);
        if let Some(workers) = self.workers {
            cfg.set_workers(workers);
        }
    }
}

fn parse_size(val: &str) -> Option<usize> {
    match val.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}
