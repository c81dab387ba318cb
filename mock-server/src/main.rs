use mock_server::MockConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let defaults = MockConfig::default();
    let config = MockConfig {
        title_id: std::env::var("MOCK_TITLE_ID").unwrap_or(defaults.title_id),
        secret_key: std::env::var("MOCK_SECRET_KEY").unwrap_or(defaults.secret_key),
    };

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, title_id = %config.title_id, "listening");
    mock_server::run(listener, config).await
}
