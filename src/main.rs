use minirest::{AppState, app, upstream::Upstream};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("minirest=debug,tower_http=debug")),
        )
        .init();

    let state = AppState::new(Upstream::from_env()?);
    let app = app(state).layer(TraceLayer::new_for_http());

    let addr = dotenv::var("MINIREST_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
