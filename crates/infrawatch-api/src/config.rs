use std::time::Duration;

use infrawatch_core::{OptimizerPolicy, FPI_MAX};

pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_addr: String,
    pub optimizer: OptimizerPolicy,
    /// Read and write timeout applied to every accepted socket.
    pub io_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            optimizer: OptimizerPolicy::default(),
            io_timeout: Duration::from_millis(DEFAULT_IO_TIMEOUT_MS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = OptimizerPolicy::default();
        let http_addr = std::env::var("INFRAWATCH_HTTP_ADDR")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        Self {
            http_addr,
            optimizer: OptimizerPolicy {
                default_budget: env_usize(
                    "INFRAWATCH_REPAIR_BUDGET",
                    defaults.default_budget,
                    1,
                    1_000,
                ),
                repaired_fpi: env_i64(
                    "INFRAWATCH_REPAIRED_FPI",
                    defaults.repaired_fpi,
                    0,
                    FPI_MAX,
                ),
            },
            io_timeout: Duration::from_millis(env_u64(
                "INFRAWATCH_HTTP_TIMEOUT_MS",
                DEFAULT_IO_TIMEOUT_MS,
                50,
                600_000,
            )),
        }
    }
}

fn env_usize(name: &str, default: usize, min: usize, max: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

fn env_u64(name: &str, default: u64, min: u64, max: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

fn env_i64(name: &str, default: i64, min: i64, max: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}
