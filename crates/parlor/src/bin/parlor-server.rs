//! The `parlor-server` binary: one process, one room.
//!
//! Bind address comes from `PARLOR_ADDR` (default `0.0.0.0:7777`); log
//! verbosity from `RUST_LOG` (default `info`).

use parlor::{ParlorError, ParlorServerBuilder};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ParlorError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("PARLOR_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:7777".to_string());

    let server = ParlorServerBuilder::new().bind(&addr).build().await?;
    tracing::info!(%addr, "parlor lobby server listening");
    server.run().await
}
