use std::sync::Arc;

use sqlx::SqlitePool;
use tracing_subscriber::EnvFilter;

use moodreel_api::{
    config::Config,
    entitlement::{EntitlementGate, HttpEntitlementBackend, SqliteQuotaStore},
    routes::create_router,
    services::{
        enrichment::EnrichmentAggregator,
        generator::OpenAiGenerator,
        metadata::{MetadataClient, TmdbClient},
        orchestrator::RecommendationOrchestrator,
        resolver::TitleResolver,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = SqlitePool::connect(&config.database_url).await?;
    SqliteQuotaStore::init(&pool).await?;

    let catalog: Arc<dyn MetadataClient> = Arc::new(TmdbClient::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    ));
    let generator = Arc::new(OpenAiGenerator::new(
        config.generator_api_key.clone(),
        config.generator_api_url.clone(),
        config.generator_model.clone(),
    ));

    let orchestrator = Arc::new(RecommendationOrchestrator::new(
        generator,
        TitleResolver::new(catalog.clone()),
        EnrichmentAggregator::new(catalog),
    ));

    let gate = Arc::new(EntitlementGate::new(
        Arc::new(SqliteQuotaStore::new(pool)),
        Arc::new(HttpEntitlementBackend::new(
            config.entitlement_api_url.clone(),
        )),
        config.max_free_invocations,
    ));

    let app = create_router(AppState { orchestrator, gate });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "moodreel-api listening");
    axum::serve(listener, app).await?;

    Ok(())
}
