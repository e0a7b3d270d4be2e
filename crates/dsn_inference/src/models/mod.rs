use std::sync::Arc;

use dsn_core::config::InferenceSettings;
use dsn_core::{InferenceModel, Result};
use tracing::{info, warn};

pub mod extractive;
pub mod gemini;

pub use extractive::ExtractiveModel;
pub use gemini::GeminiModel;

/// Gemini when an API key is configured, the offline extractive model
/// otherwise.
pub fn create_model(settings: &InferenceSettings) -> Result<Arc<dyn InferenceModel>> {
    match settings.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            let model = GeminiModel::new(settings)?;
            info!("Using Gemini model {}", settings.model);
            Ok(Arc::new(model))
        }
        _ => {
            warn!("No Gemini API key configured, falling back to extractive summaries");
            Ok(Arc::new(ExtractiveModel::new()))
        }
    }
}
