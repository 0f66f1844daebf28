use std::sync::Arc;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::presentation::config::{TranscriptionProviderSetting, TranscriptionSettings};

use super::azure_whisper_engine::AzureWhisperEngine;
use super::openai_whisper_engine::OpenAiWhisperEngine;

const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";

pub struct TranscriptionEngineFactory;

impl TranscriptionEngineFactory {
    pub fn create(
        settings: &TranscriptionSettings,
    ) -> Result<Arc<dyn TranscriptionEngine>, TranscriptionError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                TranscriptionError::Configuration(
                    "transcription.api_key is required".to_string(),
                )
            })?;

        match settings.provider {
            TranscriptionProviderSetting::OpenAi => {
                let engine = OpenAiWhisperEngine::new(
                    api_key,
                    settings.base_url.clone(),
                    Some(settings.model.clone()),
                )?;
                Ok(Arc::new(engine))
            }
            TranscriptionProviderSetting::Azure => {
                let base_url = settings.base_url.as_deref().ok_or_else(|| {
                    TranscriptionError::Configuration(
                        "transcription.base_url required for azure".to_string(),
                    )
                })?;
                let deployment = settings.azure_deployment.as_deref().unwrap_or(&settings.model);
                let api_version = settings
                    .azure_api_version
                    .as_deref()
                    .unwrap_or(DEFAULT_AZURE_API_VERSION);
                let engine = AzureWhisperEngine::new(base_url, deployment, &api_key, api_version)?;
                Ok(Arc::new(engine))
            }
        }
    }
}
