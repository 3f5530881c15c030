use cattery::{config::Config, error::Error, observability, server, state::AppState, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    observability::init_tracing(&config);

    let state = AppState::from_config(config).await?;

    sqlx::migrate!("./migrations")
        .run(state.db())
        .await
        .map_err(|e| Error::Internal(format!("Migration failed: {e}")))?;

    server::serve(state).await
}
