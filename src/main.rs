use dotenvy::dotenv;
use tracing::info;

use bookshelf_api::bootstrap::app::App;
use bookshelf_api::bootstrap::config::Config;

const VERSION: &str = match option_env!("APP_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "bookshelf_api=debug,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(
        address = %cfg.bind_address(),
        production = cfg.is_production,
        "Starting bookshelf API"
    );

    let app = App::new(cfg).await?;
    app.run(VERSION).await?;

    info!("Shutdown complete");
    Ok(())
}
