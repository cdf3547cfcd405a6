//! Speech synthesis client.
//!
//! Renders the mood description as spoken audio via an OpenAI-compatible
//! `/audio/speech` endpoint. The bytes are inlined into the result page as a
//! base64 data URI; nothing is written to disk.

use crate::config::TtsSettings;
use base64::Engine;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Failed to reach TTS backend: {0}")]
    Connection(String),
    #[error("TTS backend returned status {status}: {message}")]
    Api { status: u16, message: String },
}

pub struct TtsClient {
    client: Client,
    base_url: String,
    model: String,
    voice: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl TtsClient {
    pub fn new(settings: &TtsSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            voice: settings.voice.clone(),
            api_key: settings.api_key.clone(),
            timeout: Duration::from_secs(settings.timeout_sec),
        }
    }

    /// Synthesize `text` in the configured voice, returning mp3 bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        let url = format!("{}/audio/speech", self.base_url);

        let request = serde_json::json!({
            "model": self.model,
            "voice": self.voice,
            "input": text,
            "response_format": "mp3",
        });

        let mut req_builder = self.client.post(&url).json(&request);
        if let Some(api_key) = &self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TtsError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TtsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::Connection(e.to_string()))?;

        debug!(bytes = bytes.len(), "Synthesized speech");
        Ok(bytes.to_vec())
    }
}

/// Turn synthesized mp3 bytes into a data URI playable by an `<audio>` tag.
pub fn audio_data_uri(audio: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(audio);
    format!("data:audio/mp3;base64,{}", b64)
}
