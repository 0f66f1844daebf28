mod gemini_client;
mod llm_client_factory;
mod openai_client;

pub use gemini_client::{DEFAULT_GEMINI_BASE_URL, GeminiClient, GenerationConfig};
pub use llm_client_factory::LlmClientFactory;
pub use openai_client::{OpenAiClient, OpenAiFlavor};
