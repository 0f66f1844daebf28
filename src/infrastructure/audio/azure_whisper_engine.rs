use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use super::audio_format::{audio_mime_type, upload_file_name};
use crate::application::ports::{TranscriptionEngine, TranscriptionError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Whisper hosted as an Azure OpenAI deployment.
pub struct AzureWhisperEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl AzureWhisperEngine {
    pub fn new(
        base_url: &str,
        deployment: &str,
        api_key: &str,
        api_version: &str,
    ) -> Result<Self, TranscriptionError> {
        let endpoint = format!(
            "{}/openai/deployments/{}/audio/transcriptions?api-version={}",
            base_url.trim_end_matches('/'),
            deployment,
            api_version,
        );
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TranscriptionError::Configuration(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct AzureTranscriptionResponse {
    text: String,
}

#[async_trait]
impl TranscriptionEngine for AzureWhisperEngine {
    async fn transcribe(
        &self,
        audio_data: &[u8],
        filename: &str,
    ) -> Result<String, TranscriptionError> {
        let file_part = multipart::Part::bytes(audio_data.to_vec())
            .file_name(upload_file_name(filename))
            .mime_str(audio_mime_type(filename))
            .map_err(|e| TranscriptionError::UnsupportedFormat(format!("mime: {}", e)))?;

        let form = multipart::Form::new().part("file", file_part);

        tracing::debug!(endpoint = %self.endpoint, "Sending audio to Azure OpenAI Whisper");

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscriptionError::ApiRequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let result: AzureTranscriptionResponse = response.json().await.map_err(|e| {
            TranscriptionError::TranscriptionFailed(format!("parse response: {}", e))
        })?;

        tracing::info!(
            chars = result.text.len(),
            "Azure OpenAI Whisper transcription completed"
        );

        Ok(result.text.trim().to_string())
    }
}
