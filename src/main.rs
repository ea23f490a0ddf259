//! Pass-request service entrypoint.

use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use passdesk::config::AppConfig;
use passdesk::pdf::{PdfRenderer, ReportTemplate};
use passdesk::state::AppState;
use passdesk::store::{NotionStore, PgRosterStore, RequestStore, RosterStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "passdesk=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(engine = ?config.pdf_engine, "starting passdesk server");

    let requests = NotionStore::new(
        config.notion_token.clone(),
        config.notion_database_id.clone(),
    )?;
    let roster = Arc::new(PgRosterStore::connect(&config).await?);
    let pdf = PdfRenderer::from_config(&config)?;
    let template = ReportTemplate::new()?;

    let state = AppState::new(
        Arc::new(requests) as Arc<dyn RequestStore>,
        roster.clone() as Arc<dyn RosterStore>,
        pdf,
        template,
    );

    let app = passdesk::api::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // tear down the shared context before exiting
    roster.pool().close().await;
    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}
