use tracing_subscriber::{EnvFilter, fmt};

use tally_anything::shell::config::AppConfig;
use tally_anything::shell::{compose, http::router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = AppConfig::from_env()?;
    let state = compose(&config);

    if let Err(err) = state.authenticator.login().await {
        tracing::warn!(%err, "starting without a session, POST /session/login once a token is configured");
    }

    let app = router(state.clone());

    tracing::info!(data_dir = %config.data_dir.display(), "tally documents folder");
    tracing::info!("GraphQL endpoint: http://{}/gql", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    for err in state.dispatcher.store().settle().await {
        tracing::error!(%err, "tally document was not saved before shutdown");
    }
    Ok(())
}
