use std::time::Duration;

use encoding_rs::Encoding;
use serde::Deserialize;

use super::Environment;
use crate::application::services::{
    BatchOptions, DEFAULT_INSTRUCTIONS, DEFAULT_LABELS, DEFAULT_MAX_ATTEMPTS, RetryPolicy,
    SaveStrategy, render_instructions,
};

/// Environment variables honoured for compatibility with older deployments.
const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
const INSTRUCTIONS_VAR: &str = "instructions";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub ledger: LedgerSettings,
    pub staging: StagingSettings,
    pub transcription: TranscriptionSettings,
    pub classification: ClassificationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_mb: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    pub path: String,
    pub default_encoding: String,
    pub save_strategy: SaveStrategySetting,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            path: "transcripts.csv".to_string(),
            default_encoding: "windows-1252".to_string(),
            save_strategy: SaveStrategySetting::PerBatch,
        }
    }
}

impl LedgerSettings {
    pub fn encoding(&self) -> Result<&'static Encoding, SettingsError> {
        Encoding::for_label(self.default_encoding.trim().as_bytes()).ok_or_else(|| {
            SettingsError::Invalid(format!(
                "ledger.default_encoding: unknown encoding '{}'",
                self.default_encoding
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStrategySetting {
    PerBatch,
    PerItem,
}

impl From<SaveStrategySetting> for SaveStrategy {
    fn from(setting: SaveStrategySetting) -> Self {
        match setting {
            SaveStrategySetting::PerBatch => SaveStrategy::PerBatch,
            SaveStrategySetting::PerItem => SaveStrategy::PerItem,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StagingSettings {
    pub local_path: String,
    pub processed_prefix: Option<String>,
    pub failed_prefix: String,
    pub keep_audio_on_classification_error: bool,
    pub allowed_extensions: Vec<String>,
}

impl Default for StagingSettings {
    fn default() -> Self {
        Self {
            local_path: "uploads".to_string(),
            processed_prefix: None,
            failed_prefix: "failed".to_string(),
            keep_audio_on_classification_error: false,
            allowed_extensions: vec!["mp3".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub provider: TranscriptionProviderSetting,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub azure_deployment: Option<String>,
    pub azure_api_version: Option<String>,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: TranscriptionProviderSetting::OpenAi,
            api_key: None,
            base_url: None,
            model: "whisper-1".to_string(),
            azure_deployment: None,
            azure_api_version: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProviderSetting {
    #[serde(rename = "openai")]
    OpenAi,
    Azure,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassificationSettings {
    pub provider: ClassificationProviderSetting,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    pub azure_endpoint: Option<String>,
    pub instructions: String,
    pub labels: Vec<String>,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for ClassificationSettings {
    fn default() -> Self {
        Self {
            provider: ClassificationProviderSetting::Gemini,
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            base_url: None,
            azure_endpoint: None,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base_ms: 1000,
            temperature: 0.0,
            max_output_tokens: 10092,
        }
    }
}

impl ClassificationSettings {
    pub fn system_instruction(&self) -> String {
        render_instructions(&self.instructions, &self.labels)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationProviderSetting {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "lmstudio")]
    LmStudio,
    Azure,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_json: false,
        }
    }
}

impl Settings {
    /// Layers `appsettings.{environment}` (optional) under `APP_*` environment
    /// variables, e.g. `APP_LEDGER__PATH`, then validates the result.
    pub fn load(environment: Environment) -> Result<Self, SettingsError> {
        let file_name = format!("appsettings.{}", environment.as_str());

        let configuration = config::Config::builder()
            .add_source(config::File::with_name(&file_name).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("staging.allowed_extensions")
                    .with_list_parse_key("classification.labels")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = configuration.try_deserialize()?;
        settings.apply_legacy_env();
        settings.validate()?;
        Ok(settings)
    }

    fn apply_legacy_env(&mut self) {
        if self.classification.api_key.is_none() {
            let var = match self.classification.provider {
                ClassificationProviderSetting::Gemini => Some(GEMINI_API_KEY_VAR),
                ClassificationProviderSetting::OpenAi => Some(OPENAI_API_KEY_VAR),
                _ => None,
            };
            self.classification.api_key = var.and_then(|v| std::env::var(v).ok());
        }
        if self.transcription.api_key.is_none()
            && self.transcription.provider == TranscriptionProviderSetting::OpenAi
        {
            self.transcription.api_key = std::env::var(OPENAI_API_KEY_VAR).ok();
        }
        if let Ok(instructions) = std::env::var(INSTRUCTIONS_VAR) {
            if !instructions.trim().is_empty() {
                self.classification.instructions = instructions;
            }
        }
    }

    /// Rejects configurations the service cannot start with. Missing
    /// credentials surface here rather than on the first request.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let has_key = |key: &Option<String>| key.as_deref().is_some_and(|k| !k.trim().is_empty());

        if self.classification.provider != ClassificationProviderSetting::LmStudio
            && !has_key(&self.classification.api_key)
        {
            return Err(SettingsError::Invalid(
                "classification.api_key is required".to_string(),
            ));
        }
        if !has_key(&self.transcription.api_key) {
            return Err(SettingsError::Invalid(
                "transcription.api_key is required".to_string(),
            ));
        }
        if self.classification.max_attempts == 0 {
            return Err(SettingsError::Invalid(
                "classification.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.classification.labels.iter().all(|l| l.trim().is_empty()) {
            return Err(SettingsError::Invalid(
                "classification.labels must not be empty".to_string(),
            ));
        }
        if self
            .staging
            .allowed_extensions
            .iter()
            .all(|e| e.trim().trim_start_matches('.').is_empty())
        {
            return Err(SettingsError::Invalid(
                "staging.allowed_extensions must not be empty".to_string(),
            ));
        }
        let failed_prefix = self.staging.failed_prefix.trim().trim_matches('/');
        if failed_prefix.is_empty() || failed_prefix == "incoming" {
            return Err(SettingsError::Invalid(
                "staging.failed_prefix must be set and differ from 'incoming'".to_string(),
            ));
        }
        self.ledger.encoding()?;
        Ok(())
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            allowed_extensions: self.staging.allowed_extensions.clone(),
            processed_prefix: self
                .staging
                .processed_prefix
                .clone()
                .filter(|p| !p.trim().is_empty()),
            failed_prefix: self.staging.failed_prefix.trim().to_string(),
            keep_audio_on_classification_error: self.staging.keep_audio_on_classification_error,
            save_strategy: self.ledger.save_strategy.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("configuration load failed: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
