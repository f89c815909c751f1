use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use procurement_backend::{config::Config, db::connection::create_pool, router, state::AppState};

fn redact_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "procurement_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        database_url = %redact_database_url(&config.database_url),
        max_connections = config.database_max_connections,
        statement_timeout_ms = config.database_statement_timeout_ms,
        bind_addr = %config.bind_addr,
        "Loaded configuration from environment/.env"
    );

    let pool = create_pool(&config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid BIND_ADDR: {}", config.bind_addr))?;
    let app = router::app_router(AppState::new(pool, config));

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
