use std::fmt;

use super::BatchId;
use super::call_id::base_name;

const INCOMING_PREFIX: &str = "incoming";

/// Key of an object in the staging area. Segments are always joined with `/`,
/// independent of the host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn incoming(batch_id: &BatchId, filename: &str) -> Self {
        Self::join(&[INCOMING_PREFIX, &batch_id.to_string(), base_name(filename)])
    }

    pub fn processed(prefix: &str, batch_id: &BatchId, filename: &str) -> Self {
        Self::join(&[prefix, &batch_id.to_string(), base_name(filename)])
    }

    /// Retry inbox for audio whose call did not make it into the saved ledger.
    pub fn failed(prefix: &str, batch_id: &BatchId, filename: &str) -> Self {
        Self::join(&[prefix, &batch_id.to_string(), base_name(filename)])
    }

    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn join(segments: &[&str]) -> Self {
        let joined = segments
            .iter()
            .map(|s| s.trim_matches('/'))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
