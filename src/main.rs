use promptcanvas::{
    logger::{self, LoggerConfig},
    Config, ImageClient,
};
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let mut logger_config = LoggerConfig::from_config(&config);
    if let Ok(path) = env::var("LOG_FILE") {
        logger_config = logger_config.with_file_output(&path);
    }
    if let Err(e) = logger::init_with_config(logger_config) {
        eprintln!("❌ Failed to initialize logger: {}", e);
        std::process::exit(1);
    }

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("No .env file found, using system environment variables");
    }

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), &config);
    logger::log_config_info(&config);

    if !ImageClient::supported_models()
        .iter()
        .any(|(id, _, _)| *id == config.openai.model)
    {
        log::warn!(
            "Image model {} is not in the known list, requests may be rejected",
            config.openai.model
        );
    }

    promptcanvas::server::run(config).await
}
