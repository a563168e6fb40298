use log::info;
use sg_auditor::api::server::start_server;
use sg_auditor::config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration
    let config = Config::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config.logging.log_level.as_str()));

    info!("Starting SG Auditor...");
    info!(
        "Server will start on {}:{} ({})",
        config.server.host, config.server.port, config.server.environment
    );

    // Start server
    start_server(config).await
}
