//! Common types for emotion inference.

use crate::extract::MAX_KEYWORDS;
use serde::Serialize;

/// The outcome of analyzing one user submission.
///
/// Produced once per submission and discarded after rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodResult {
    /// Human-language description of the mood, in the target locale.
    pub description: String,
    /// Up to three short catalog search phrases.
    pub keywords: Vec<String>,
}

impl MoodResult {
    /// Create a mood result, capping the keyword list at [`MAX_KEYWORDS`].
    pub fn new(description: impl Into<String>, mut keywords: Vec<String>) -> Self {
        keywords.truncate(MAX_KEYWORDS);
        Self {
            description: description.into(),
            keywords,
        }
    }
}
