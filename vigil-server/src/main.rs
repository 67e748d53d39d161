use vigil_server::utils::logger;
use vigil_server::{AppState, Config, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (.env is optional)
    dotenv::dotenv().ok();

    // 2. Configuration + logging
    let config = Config::from_env();
    logger::init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!("vigil server starting...");

    // 3. Application state
    let state = AppState::initialize(&config);

    // 4. HTTP server
    let server = Server::with_state(config, state);
    server.run().await
}
