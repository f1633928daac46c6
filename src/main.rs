use clap::Parser;
use eyre::Result;
use log::info;

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; deployed environments set variables directly
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = ytchat::config::Config::from_env();
    info!("Allowed CORS origins: {}", config.allowed_origins.join(", "));

    let state = ytchat::server::AppState::new(config);
    let app = ytchat::server::build_app(state);

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
