use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::LlmClient;
use crate::domain::CLASSIFICATION_ERROR_LABEL;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

pub const DEFAULT_LABELS: [&str; 6] = [
    "Complaint",
    "Query",
    "Compliment",
    "late-Delivery",
    "Exchange",
    "Other",
];

pub const DEFAULT_INSTRUCTIONS: &str = "You classify transcripts of customer-service phone calls. \
Answer with exactly one of these labels: {labels}. \
When the caller clearly has more than one intent, answer with every matching label joined by '/' \
in the order they appear in the list above, for example Complaint/Query. \
Answer with the label text only, without punctuation or explanation.";

/// Substitutes the label list into an instruction template's `{labels}` slot.
pub fn render_instructions(template: &str, labels: &[String]) -> String {
    template.replace("{labels}", &labels.join(", "))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Wait after the `attempt`-th rate-limited call (1-based): `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

/// Labels call transcripts through an [`LlmClient`].
///
/// Each transcript is sent as its own single-turn request, so nothing said on
/// one call can influence the label of another. Rate-limit errors are retried
/// with exponential backoff; every other failure, and running out of attempts,
/// degrades to [`CLASSIFICATION_ERROR_LABEL`].
pub struct TranscriptClassifier {
    llm_client: Arc<dyn LlmClient>,
    system_instruction: String,
    retry_policy: RetryPolicy,
}

impl TranscriptClassifier {
    pub fn new(
        llm_client: Arc<dyn LlmClient>,
        system_instruction: String,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            llm_client,
            system_instruction,
            retry_policy,
        }
    }

    pub async fn classify(&self, transcript: &str) -> String {
        match self.try_classify(transcript).await {
            Ok(label) => label,
            Err(e) => {
                tracing::warn!(error = %e, "Classification failed, recording error label");
                CLASSIFICATION_ERROR_LABEL.to_string()
            }
        }
    }

    pub async fn try_classify(&self, transcript: &str) -> Result<String, ClassificationFailure> {
        let max_attempts = self.retry_policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self
                .llm_client
                .complete(&self.system_instruction, transcript)
                .await
            {
                Ok(text) => {
                    let label = text.trim();
                    if label.is_empty() {
                        return Err(ClassificationFailure::Other(
                            "empty completion".to_string(),
                        ));
                    }
                    tracing::debug!(attempt, label, "Transcript classified");
                    return Ok(label.to_string());
                }
                Err(e) if e.is_rate_limited() => {
                    if attempt >= max_attempts {
                        return Err(ClassificationFailure::RateLimited { attempts: attempt });
                    }
                    let delay = self.retry_policy.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Classification rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(ClassificationFailure::Other(e.to_string())),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationFailure {
    #[error("still rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },
    #[error("{0}")]
    Other(String),
}
