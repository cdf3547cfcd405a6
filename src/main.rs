use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moodtune_server::catalog::{CatalogClient, CatalogSearcher};
use moodtune_server::config::{AppConfig, CliConfig, FileConfig, InferenceBackend};
use moodtune_server::inference::make_inferer;
use moodtune_server::recommend::Recommender;
use moodtune_server::server;
use moodtune_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use moodtune_server::tts::TtsClient;

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served instead of the
    /// built-in pages.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Inference backend to use, unless the config file says otherwise.
    #[clap(long, value_enum)]
    pub inference_backend: Option<InferenceBackend>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        frontend_dir_path: cli_args.frontend_dir_path,
        inference_backend: cli_args.inference_backend,
    };

    let config =
        AppConfig::resolve(&cli_config, file_config).context("Failed to resolve configuration")?;

    info!("Initializing metrics...");
    server::metrics::init_metrics();

    let inferer = make_inferer(&config.inference);
    info!(
        backend = inferer.name(),
        base_url = %config.inference.base_url,
        model = %config.inference.model,
        "Inference backend configured"
    );

    let catalog: Arc<dyn CatalogSearcher> = Arc::new(CatalogClient::new(&config.catalog));
    info!(api_base = %config.catalog.api_base, "Catalog client configured");

    let tts = config.tts.as_ref().map(|settings| {
        info!(base_url = %settings.base_url, voice = %settings.voice, "TTS configured");
        TtsClient::new(settings)
    });

    let recommender = Arc::new(Recommender::new(inferer, catalog, tts));

    let server_config = ServerConfig {
        port: config.port,
        requests_logging_level: config.logging_level,
        frontend_dir_path: config.frontend_dir_path,
    };

    run_server(server_config, recommender).await
}
