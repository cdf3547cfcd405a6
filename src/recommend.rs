//! Pipeline orchestration: input → inference → catalog search → rendering data.
//!
//! One linear sequence per submission; nothing is retained between
//! submissions.

use crate::catalog::{CatalogError, CatalogSearcher, Track};
use crate::inference::{EmotionInferer, InferenceError, MoodResult};
use crate::tts::{audio_data_uri, TtsClient};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// A rendered-ready recommendation for one submission.
#[derive(Debug)]
pub struct Recommendation {
    pub mood: MoodResult,
    pub tracks: Vec<Track>,
    /// Spoken rendition of the description, as a playable data URI.
    /// Only produced for text submissions, and only when TTS is configured.
    pub audio_data_uri: Option<String>,
}

/// Typed pipeline error, so the presentation layer can choose user messaging
/// per kind instead of flattening everything to one string.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub struct Recommender {
    inferer: Box<dyn EmotionInferer>,
    catalog: Arc<dyn CatalogSearcher>,
    tts: Option<TtsClient>,
}

impl Recommender {
    pub fn new(
        inferer: Box<dyn EmotionInferer>,
        catalog: Arc<dyn CatalogSearcher>,
        tts: Option<TtsClient>,
    ) -> Self {
        Self {
            inferer,
            catalog,
            tts,
        }
    }

    pub async fn recommend_for_image(
        &self,
        image: &[u8],
        mime: &str,
    ) -> Result<Recommendation, RecommendError> {
        let mood = self.inferer.infer_image(image, mime).await?;
        info!(backend = self.inferer.name(), keywords = ?mood.keywords, "Inferred mood from image");
        self.finish(mood, false).await
    }

    pub async fn recommend_for_text(&self, text: &str) -> Result<Recommendation, RecommendError> {
        let mood = self.inferer.infer_text(text).await?;
        info!(backend = self.inferer.name(), keywords = ?mood.keywords, "Inferred mood from text");
        self.finish(mood, true).await
    }

    async fn finish(
        &self,
        mood: MoodResult,
        with_audio: bool,
    ) -> Result<Recommendation, RecommendError> {
        let token = self.catalog.get_access_token().await?;
        let tracks = self.catalog.search_tracks(&mood.keywords, &token).await?;

        // TTS failure is non-fatal, the page just renders without the player
        let audio = match (&self.tts, with_audio) {
            (Some(tts), true) => match tts.synthesize(&mood.description).await {
                Ok(bytes) => Some(audio_data_uri(&bytes)),
                Err(err) => {
                    warn!(error = %err, "Speech synthesis failed");
                    None
                }
            },
            _ => None,
        };

        Ok(Recommendation {
            mood,
            tracks,
            audio_data_uri: audio,
        })
    }
}
