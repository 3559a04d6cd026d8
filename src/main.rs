use std::sync::Arc;

use tracing::{error, info};

use forum::{AppState, BoardService, Config, Database, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let mut config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = forum::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        forum::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> forum::Result<()> {
    config.validate()?;
    info!("{} starting", config.forum.name);

    let db = Database::open(&config.database.path).await?;

    let created = BoardService::new(&db)
        .seed_boards(&config.forum.boards)
        .await?;
    if created > 0 {
        info!(created, "Seeded boards from configuration");
    }

    let state = AppState::from_config(Arc::new(config), db)?;
    WebServer::new(Arc::new(state))?.run().await?;
    Ok(())
}
