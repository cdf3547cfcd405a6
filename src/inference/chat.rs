//! Chat-completion inference backend.
//!
//! Works with OpenAI, Ollama's OpenAI-compatible endpoint, and any other
//! service implementing the chat completions API. The model returns one block
//! of text containing both the description and keyword hints, which is split
//! heuristically by [`crate::extract`].

use super::types::MoodResult;
use super::{EmotionInferer, InferenceError};
use crate::config::InferenceSettings;
use crate::extract::split_mood_text;
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str = "你是一位情緒分析助手。請分析使用者提供的圖片或文字所傳遞的情緒，\
    用一小段優美、詩意的【中文】文字描述它的氛圍（80~100 字，語氣溫柔、文藝，不要太誇張），\
    並提供三個適合在 Spotify 搜尋的英文音樂關鍵字或短語。\
    格式如下：\n情緒描述：...\n標籤：...";

const IMAGE_USER_PROMPT: &str = "請分析這張圖片的情緒與氛圍。";

/// Low-level client for an OpenAI-compatible chat completions endpoint.
///
/// Shared by the chat inferer and the classifier's description step.
pub(super) struct ChatClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    timeout: Duration,
}

impl ChatClient {
    pub(super) fn new(settings: &InferenceSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_sec),
        }
    }

    /// Send a completion request and return the assistant's text.
    pub(super) async fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<String, InferenceError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
        };

        debug!(model = %self.model, "Sending completion request");

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

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            InferenceError::InvalidResponse(format!("Failed to parse completion response: {}", e))
        })?;

        let choice = chat_response.choices.into_iter().next().ok_or_else(|| {
            InferenceError::InvalidResponse("No choices in completion response".to_string())
        })?;

        match choice.message.content {
            Some(content) if !content.is_empty() => Ok(content),
            _ => Err(InferenceError::InvalidResponse(
                "Empty completion content".to_string(),
            )),
        }
    }
}

/// Chat-based emotion inferer, in vision or text-only flavor.
pub struct ChatInferer {
    chat: ChatClient,
    accepts_images: bool,
}

impl ChatInferer {
    /// Multimodal variant. Accepts both images and text.
    pub fn vision(settings: &InferenceSettings) -> Self {
        Self {
            chat: ChatClient::new(settings),
            accepts_images: true,
        }
    }

    /// Text-only variant. Image submissions are rejected as unsupported.
    pub fn text_only(settings: &InferenceSettings) -> Self {
        Self {
            chat: ChatClient::new(settings),
            accepts_images: false,
        }
    }

    fn split(completion: &str) -> MoodResult {
        let (description, keywords) = split_mood_text(completion);
        MoodResult::new(description, keywords)
    }
}

#[async_trait]
impl EmotionInferer for ChatInferer {
    fn name(&self) -> &str {
        if self.accepts_images {
            "vision-chat"
        } else {
            "text-chat"
        }
    }

    async fn infer_image(&self, image: &[u8], mime: &str) -> Result<MoodResult, InferenceError> {
        if !self.accepts_images {
            return Err(InferenceError::Unsupported("image"));
        }

        let base64_image = base64::engine::general_purpose::STANDARD.encode(image);
        let data_url = format!("data:{};base64,{}", mime, base64_image);

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user_with_image(IMAGE_USER_PROMPT, &data_url),
        ];

        let completion = self.chat.complete(messages).await?;
        Ok(Self::split(&completion))
    }

    async fn infer_text(&self, text: &str) -> Result<MoodResult, InferenceError> {
        let user_prompt = format!("根據以下的描述，請分析它所傳遞的情緒：\n{}", text);
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user_text(&user_prompt),
        ];

        let completion = self.chat.complete(messages).await?;
        Ok(Self::split(&completion))
    }
}

// Chat completions API types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatMessage {
    role: &'static str,
    content: serde_json::Value,
}

impl ChatMessage {
    pub(super) fn system(text: &str) -> Self {
        Self {
            role: "system",
            content: serde_json::Value::String(text.to_string()),
        }
    }

    pub(super) fn user_text(text: &str) -> Self {
        Self {
            role: "user",
            content: serde_json::Value::String(text.to_string()),
        }
    }

    /// User message carrying an inline base64 image next to a text part.
    pub(super) fn user_with_image(text: &str, data_url: &str) -> Self {
        Self {
            role: "user",
            content: serde_json::json!([
                { "type": "image_url", "image_url": { "url": data_url } },
                { "type": "text", "text": text },
            ]),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
