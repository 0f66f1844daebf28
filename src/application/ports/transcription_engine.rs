use async_trait::async_trait;

#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// `filename` is the declared upload name; engines use its extension to
    /// describe the audio format to the backend.
    async fn transcribe(&self, audio_data: &[u8], filename: &str)
    -> Result<String, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("configuration: {0}")]
    Configuration(String),
}
