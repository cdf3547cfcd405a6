//! Moodtune Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod config;
pub mod extract;
pub mod inference;
pub mod recommend;
pub mod server;
pub mod tts;

// Re-export commonly used types for convenience
pub use catalog::{CatalogClient, CatalogSearcher, Track};
pub use config::{AppConfig, CliConfig, FileConfig};
pub use inference::{make_inferer, EmotionInferer, MoodResult};
pub use recommend::{Recommendation, Recommender};
pub use server::{run_server, RequestsLoggingLevel, ServerConfig};
