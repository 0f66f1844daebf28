use callscribe::application::ports::TranscriptionError;
use callscribe::infrastructure::audio::TranscriptionEngineFactory;
use callscribe::presentation::config::{TranscriptionProviderSetting, TranscriptionSettings};

#[test]
fn given_openai_with_key_when_creating_engine_then_succeeds() {
    let settings = TranscriptionSettings {
        api_key: Some("sk-test".to_string()),
        ..TranscriptionSettings::default()
    };

    assert!(TranscriptionEngineFactory::create(&settings).is_ok());
}

#[test]
fn given_missing_key_when_creating_engine_then_configuration_error() {
    let result = TranscriptionEngineFactory::create(&TranscriptionSettings::default());

    assert!(matches!(result, Err(TranscriptionError::Configuration(_))));
}

#[test]
fn given_azure_without_base_url_when_creating_engine_then_configuration_error() {
    let settings = TranscriptionSettings {
        provider: TranscriptionProviderSetting::Azure,
        api_key: Some("az-key".to_string()),
        ..TranscriptionSettings::default()
    };

    let result = TranscriptionEngineFactory::create(&settings);

    assert!(matches!(result, Err(TranscriptionError::Configuration(_))));
}
