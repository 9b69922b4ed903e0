use anyhow::Context;
use api::{BackendClient, BackendConfig};

use web::settings::Settings;
use web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new().context("Failed to load server settings")?;
    web::logger::init_tracing(settings.log.json);

    let config = BackendConfig::from_env()
        .context("Backend is not configured; set SUPABASE_URL and SUPABASE_ANON_KEY")?;
    let backend = BackendClient::new(config).context("Failed to build backend client")?;

    let addr = settings.server.address();
    let router = web::router(AppState::new(backend, settings));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router.into_make_service())
        .await
        .context("Server error")?;
    Ok(())
}
