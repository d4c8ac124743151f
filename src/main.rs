//! Trending Aggregator Service: binary entrypoint.
//! Boots the Axum HTTP server with the trending routes and `/metrics`.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the tracing subscriber.
/// `RUST_LOG` wins over the default filter; `TRENDING_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trending=info,warn"));

    let json = std::env::var("TRENDING_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    // try_init: the runtime may already have installed a global subscriber.
    let _ = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let router = trending_aggregator::app().await?;
    Ok(router.into())
}
