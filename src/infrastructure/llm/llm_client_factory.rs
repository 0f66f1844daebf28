use std::sync::Arc;

use crate::application::ports::{LlmClient, LlmClientError};
use crate::presentation::config::{ClassificationProviderSetting, ClassificationSettings};

use super::gemini_client::{GeminiClient, GenerationConfig};
use super::openai_client::{OpenAiClient, OpenAiFlavor};

pub struct LlmClientFactory;

impl LlmClientFactory {
    pub fn create(
        settings: &ClassificationSettings,
    ) -> Result<Arc<dyn LlmClient>, LlmClientError> {
        let api_key = settings.api_key.clone().unwrap_or_default();

        match settings.provider {
            ClassificationProviderSetting::Gemini => {
                let generation_config = GenerationConfig {
                    temperature: settings.temperature,
                    max_output_tokens: settings.max_output_tokens,
                    ..GenerationConfig::default()
                };
                let client = GeminiClient::new(
                    require_key(api_key, "gemini")?,
                    settings.model.clone(),
                    settings.base_url.clone(),
                    generation_config,
                )?;
                Ok(Arc::new(client))
            }
            ClassificationProviderSetting::OpenAi => {
                let base_url = settings
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
                let api_key = require_key(api_key, "openai")?;
                openai_compatible(OpenAiFlavor::OpenAi, base_url, api_key, settings)
            }
            ClassificationProviderSetting::LmStudio => {
                let base_url = settings.base_url.clone().ok_or_else(|| {
                    LlmClientError::Configuration(
                        "base_url required for lmstudio provider".to_string(),
                    )
                })?;
                openai_compatible(OpenAiFlavor::LmStudio, base_url, api_key, settings)
            }
            ClassificationProviderSetting::Azure => {
                let endpoint = settings.azure_endpoint.as_ref().ok_or_else(|| {
                    LlmClientError::Configuration(
                        "azure_endpoint required for azure provider".to_string(),
                    )
                })?;
                let base_url = format!(
                    "{}/openai/deployments/{}",
                    endpoint.trim_end_matches('/'),
                    settings.model
                );
                let api_key = require_key(api_key, "azure")?;
                openai_compatible(OpenAiFlavor::Azure, base_url, api_key, settings)
            }
        }
    }
}

fn openai_compatible(
    flavor: OpenAiFlavor,
    base_url: String,
    api_key: String,
    settings: &ClassificationSettings,
) -> Result<Arc<dyn LlmClient>, LlmClientError> {
    let client = OpenAiClient::new(
        flavor,
        base_url,
        api_key,
        settings.model.clone(),
        settings.max_output_tokens,
        settings.temperature,
    )?;
    Ok(Arc::new(client))
}

fn require_key(api_key: String, provider: &str) -> Result<String, LlmClientError> {
    if api_key.trim().is_empty() {
        return Err(LlmClientError::Configuration(format!(
            "api_key required for {} provider",
            provider
        )));
    }
    Ok(api_key)
}
