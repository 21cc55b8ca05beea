use std::io;
use std::sync::Arc;

use infrawatch_api::logging::init_tracing;
use infrawatch_api::{ApiServer, ServerConfig};

fn main() -> io::Result<()> {
    init_tracing();
    let config = ServerConfig::from_env();
    tracing::info!(
        addr = %config.http_addr,
        default_budget = config.optimizer.default_budget,
        repaired_fpi = config.optimizer.repaired_fpi,
        io_timeout = ?config.io_timeout,
        "starting infrawatchd"
    );
    let server = Arc::new(ApiServer::new(&config));
    server.serve_http(&config.http_addr)
}
