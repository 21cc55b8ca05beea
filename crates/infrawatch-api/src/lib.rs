pub mod config;
pub mod logging;
pub mod protocol;
pub mod server;

pub use config::ServerConfig;
pub use server::{ApiServer, HttpResponse};
