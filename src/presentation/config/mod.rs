mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    ClassificationProviderSetting, ClassificationSettings, LedgerSettings, LoggingSettings,
    SaveStrategySetting, ServerSettings, Settings, SettingsError, StagingSettings,
    TranscriptionProviderSetting, TranscriptionSettings,
};
