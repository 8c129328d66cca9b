mod api;
mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use medicord_core::config::{AppConfig, LoadOptions, ServerConfig};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

fn init_logging(config: &AppConfig) {
    use medicord_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

fn cors_layer(server: &ServerConfig) -> Result<CorsLayer> {
    let origin = if server.cors_origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        let value = HeaderValue::from_str(server.cors_origin.trim())
            .with_context(|| format!("invalid server.cors_origin `{}`", server.cors_origin))?;
        AllowOrigin::exact(value)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let router = Router::new()
        .merge(health::router(app.health_state()))
        .merge(api::router(app.api_state()))
        .layer(cors_layer(&app.config.server)?)
        .layer(TraceLayer::new_for_http());

    let address = app.config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("could not bind `{address}`"))?;
    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "medicord-server listening"
    );

    let (stop_tx, mut stop_rx) = tokio::sync::watch::channel(false);
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = stop_rx.wait_for(|stopping| *stopping).await;
    });
    let mut serving = tokio::spawn(async move { server.await });

    tokio::select! {
        served = &mut serving => {
            served??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => signal?,
    }

    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = app.config.server.graceful_shutdown_secs,
        "medicord-server draining in-flight requests"
    );
    let _ = stop_tx.send(true);

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, &mut serving).await {
        Ok(served) => served??,
        Err(_) => {
            warn!(
                event_name = "system.server.shutdown_timeout",
                correlation_id = "shutdown",
                "grace period elapsed before all requests finished"
            );
            serving.abort();
        }
    }

    app.db_pool.close().await;
    info!(event_name = "system.server.stopped", correlation_id = "shutdown", "medicord-server stopped");
    Ok(())
}
