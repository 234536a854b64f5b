use anyhow::Context;

use quizdesk_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quizdesk_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let store = quizdesk_api::app::services::build_store(&config.persistence)
        .await
        .context("failed to open the store")?;

    let app = quizdesk_api::app::build_app(store, config.pagination)
        .context("invalid route registration")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
