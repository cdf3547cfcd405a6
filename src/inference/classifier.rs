//! Local embedding classifier backend.
//!
//! Embeds the submitted text and a fixed vocabulary of mood-label prompts,
//! ranks the labels by cosine similarity and uses the top three as search
//! keywords. The human-readable description is produced by a secondary chat
//! call over those labels. Image input is not supported by this backend;
//! deployments that accept image uploads should configure a chat backend.

use super::chat::{ChatClient, ChatMessage};
use super::types::MoodResult;
use super::{EmotionInferer, InferenceError};
use crate::config::InferenceSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// The fixed mood vocabulary used as classifier prompt anchors.
const MOOD_LABELS: [&str; 22] = [
    "joyful",
    "cheerful",
    "melancholic",
    "gloomy",
    "furious",
    "relaxed",
    "peaceful",
    "romantic",
    "dreamy",
    "mysterious",
    "eerie",
    "vibrant",
    "intense",
    "anxious",
    "nostalgic",
    "sentimental",
    "chill",
    "lo-fi",
    "energetic",
    "calm",
    "hopeful",
    "lonely",
];

const TOP_LABELS: usize = 3;

/// Embedding + cosine-similarity emotion inferer.
pub struct ClassifierInferer {
    client: Client,
    base_url: String,
    embeddings_model: String,
    api_key: Option<String>,
    timeout: Duration,
    chat: ChatClient,
}

impl ClassifierInferer {
    pub fn new(settings: &InferenceSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            embeddings_model: settings.embeddings_model.clone(),
            api_key: settings.api_key.clone(),
            timeout: Duration::from_secs(settings.timeout_sec),
            chat: ChatClient::new(settings),
        }
    }

    /// Embed all inputs in one request, preserving order.
    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, InferenceError> {
        let url = format!("{}/embeddings", self.base_url);
        let expected = inputs.len();

        let request = EmbeddingsRequest {
            model: self.embeddings_model.clone(),
            input: inputs,
        };

        debug!(model = %self.embeddings_model, count = expected, "Embedding inputs");

        let mut req_builder = self.client.post(&url).json(&request);
        if let Some(api_key) = &self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout
                } else {
                    InferenceError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: EmbeddingsResponse = response.json().await.map_err(|e| {
            InferenceError::InvalidResponse(format!("Failed to parse embeddings response: {}", e))
        })?;

        if body.data.len() != expected {
            return Err(InferenceError::InvalidResponse(format!(
                "Expected {} embeddings, got {}",
                expected,
                body.data.len()
            )));
        }

        Ok(body.data.into_iter().map(|item| item.embedding).collect())
    }

    async fn describe_labels(&self, labels: &[&str]) -> Result<String, InferenceError> {
        let prompt = format!(
            "根據這些情緒標籤：{}，請用一段優美、詩意的【中文】文字描述這段情境的情緒與氛圍。\
             請避免任何英文詞彙，也不要中英夾雜。控制在 80~100 字以內，語氣溫柔、文藝，不要太誇張。",
            labels.join(", ")
        );
        self.chat.complete(vec![ChatMessage::user_text(&prompt)]).await
    }
}

#[async_trait]
impl EmotionInferer for ClassifierInferer {
    fn name(&self) -> &str {
        "classifier"
    }

    async fn infer_image(&self, _image: &[u8], _mime: &str) -> Result<MoodResult, InferenceError> {
        Err(InferenceError::Unsupported("image"))
    }

    async fn infer_text(&self, text: &str) -> Result<MoodResult, InferenceError> {
        let mut inputs = Vec::with_capacity(1 + MOOD_LABELS.len());
        inputs.push(text.to_string());
        inputs.extend(
            MOOD_LABELS
                .iter()
                .map(|mood| format!("This text evokes a {} feeling", mood)),
        );

        let mut embeddings = self.embed(inputs).await?;
        let input_embedding = embeddings.remove(0);

        let top: Vec<&str> = top_labels(&input_embedding, &embeddings, TOP_LABELS)
            .into_iter()
            .map(|i| MOOD_LABELS[i])
            .collect();

        debug!(labels = ?top, "Classifier ranked mood labels");

        let description = self.describe_labels(&top).await?;
        let keywords = top.iter().map(|label| label.to_string()).collect();
        Ok(MoodResult::new(description, keywords))
    }
}

/// Indices of the `count` label embeddings most similar to `input`,
/// most similar first.
fn top_labels(input: &[f32], label_embeddings: &[Vec<f32>], count: usize) -> Vec<usize> {
    let mut ranked: Vec<(usize, f32)> = label_embeddings
        .iter()
        .enumerate()
        .map(|(i, embedding)| (i, cosine_similarity(input, embedding)))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().take(count).map(|(i, _)| i).collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// Embeddings API types

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}
