mod file_config;

pub use file_config::{CatalogConfig, FileConfig, InferenceConfig, TtsConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub inference_backend: Option<InferenceBackend>,
}

/// Which backend produces the mood analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InferenceBackend {
    /// Embedding + cosine-similarity ranking over a fixed mood vocabulary.
    Classifier,
    /// Multimodal chat completion, accepts both images and text.
    VisionChat,
    /// Text-only chat completion.
    TextChat,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,

    // External collaborators
    pub inference: InferenceSettings,
    pub catalog: CatalogSettings,
    pub tts: Option<TtsSettings>,
}

#[derive(Debug, Clone)]
pub struct InferenceSettings {
    pub backend: InferenceBackend,
    pub base_url: String,
    pub model: String,
    pub embeddings_model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub token_url: String,
    pub api_base: String,
    pub client_id: String,
    pub client_secret: String,
    pub per_keyword_limit: u32,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct TtsSettings {
    pub base_url: String,
    pub model: String,
    pub voice: String,
    pub api_key: Option<String>,
    pub timeout_sec: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments, optional TOML file config and
    /// the process environment. TOML values override CLI values where present.
    /// Credentials are read from the environment exactly once, here; nothing
    /// else in the crate touches environment variables.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        Self::resolve_with_env(cli, file_config, |key| std::env::var(key).ok())
    }

    pub fn resolve_with_env<E>(
        cli: &CliConfig,
        file_config: Option<FileConfig>,
        env: E,
    ) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        // Inference settings - merge file config with defaults
        let inf_file = file.inference.unwrap_or_default();
        let backend = match inf_file.backend {
            Some(name) => match parse_inference_backend(&name) {
                Some(backend) => backend,
                None => bail!("Unknown inference backend: {:?}", name),
            },
            None => cli.inference_backend.unwrap_or(InferenceBackend::VisionChat),
        };
        let inference = InferenceSettings {
            backend,
            base_url: inf_file
                .base_url
                .unwrap_or_else(|| "http://localhost:11434/v1".to_string()),
            model: inf_file.model.unwrap_or_else(|| "llama3.2:1b".to_string()),
            embeddings_model: inf_file
                .embeddings_model
                .unwrap_or_else(|| "nomic-embed-text".to_string()),
            api_key: env("INFERENCE_API_KEY"),
            temperature: inf_file.temperature.unwrap_or(0.4),
            timeout_sec: inf_file.timeout_sec.unwrap_or(120),
        };

        // Catalog credentials are mandatory, the service is useless without them
        let client_id = match env("SPOTIFY_CLIENT_ID") {
            Some(id) if !id.is_empty() => id,
            _ => bail!("SPOTIFY_CLIENT_ID must be set in the environment"),
        };
        let client_secret = match env("SPOTIFY_CLIENT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => bail!("SPOTIFY_CLIENT_SECRET must be set in the environment"),
        };

        let cat_file = file.catalog.unwrap_or_default();
        let catalog = CatalogSettings {
            token_url: cat_file
                .token_url
                .unwrap_or_else(|| "https://accounts.spotify.com/api/token".to_string()),
            api_base: cat_file
                .api_base
                .unwrap_or_else(|| "https://api.spotify.com/v1".to_string()),
            client_id,
            client_secret,
            per_keyword_limit: cat_file.per_keyword_limit.unwrap_or(2),
            timeout_sec: cat_file.timeout_sec.unwrap_or(30),
        };

        // TTS is enabled by the presence of a [tts] section with a base_url
        let tts = file.tts.and_then(|tts_file| {
            tts_file.base_url.map(|base_url| TtsSettings {
                base_url,
                model: tts_file.model.unwrap_or_else(|| "tts-1".to_string()),
                voice: tts_file.voice.unwrap_or_else(|| "alloy".to_string()),
                api_key: env("INFERENCE_API_KEY"),
                timeout_sec: tts_file.timeout_sec.unwrap_or(60),
            })
        });

        Ok(Self {
            port,
            logging_level,
            frontend_dir_path,
            inference,
            catalog,
            tts,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

fn parse_inference_backend(s: &str) -> Option<InferenceBackend> {
    InferenceBackend::from_str(s, true).ok()
}
