use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,

    // Feature configs
    pub inference: Option<InferenceConfig>,
    pub catalog: Option<CatalogConfig>,
    pub tts: Option<TtsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct InferenceConfig {
    /// Inference backend to use: "classifier", "vision-chat", "text-chat"
    pub backend: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Embedding model used by the classifier backend.
    pub embeddings_model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub token_url: Option<String>,
    pub api_base: Option<String>,
    pub per_keyword_limit: Option<u32>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct TtsConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
