use atmosfera::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    demo::ensure_demo_accounts,
    logging::init_tracing,
    repository::{MemoryRepository, PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;

/// main
///
/// Loads configuration, installs logging, connects persistence and serves the
/// router until the process is stopped.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    // 2. Logging: pretty locally, JSON in production
    init_tracing(config.env);
    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Persistence: Postgres when configured, otherwise the in-memory store
    let repo: RepositoryState = match &config.db_url {
        Some(db_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await?;
            let repo = PostgresRepository::new(pool);
            repo.migrate().await?;
            tracing::info!("Connected to Postgres, migrations applied");
            Arc::new(repo)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Arc::new(MemoryRepository::new())
        }
    };

    // LOCAL-ONLY: one ready-made account per role for the demo switcher.
    if config.env == Env::Local {
        let accounts = ensure_demo_accounts(repo.as_ref()).await?;
        for account in &accounts {
            tracing::info!(role = %account.role, user_id = %account.user_id, "demo account ready");
        }
    }

    // 4. Router and server
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { repo, config });

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await?;
    Ok(())
}
