use anyhow::Context;
use spellcaster::{
    api, CollateralRegistry, Config, ContextRefresher, HttpDataSource, PositionComputer,
    SpellCompiler, StrategyRegistry, StrategySession, TokenRegistry,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;
    let port = config.port;

    let feed = Arc::new(HttpDataSource::new(config.feed_url.clone()));
    let computer = PositionComputer::new(CollateralRegistry::mainnet(), config.working_precision);
    let refresher = Arc::new(ContextRefresher::new(feed.clone(), computer));

    // The first refresh happens on the spawned task's immediate tick.
    let refresh_task = refresher.clone().spawn(config.refresh_interval());

    let session = Arc::new(StrategySession::new(
        refresher,
        StrategyRegistry::builtin(),
        TokenRegistry::mainnet(),
        SpellCompiler::new(feed),
        config,
    ));
    let app = api::create_router(api::AppState::new(session));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    let served = axum::serve(listener, app).await.context("Server error");
    refresh_task.abort();
    served
}
