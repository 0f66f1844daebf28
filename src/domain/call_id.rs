use std::fmt;

use serde::Serialize;

/// Stable ledger key derived from an uploaded recording's base name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Takes the last path component of `filename` (either separator style)
    /// and strips its extension. Returns `None` when nothing is left.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (stem, _) = split_file_name(filename);
        let stem = stem.trim();
        if stem.is_empty() {
            None
        } else {
            Some(Self(stem.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last path component of a declared upload name.
pub fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// Extension of the base name, without the dot. A leading dot alone does not
/// start an extension (`.mp3` has none).
pub fn file_extension(filename: &str) -> Option<&str> {
    split_file_name(filename).1
}

fn split_file_name(filename: &str) -> (&str, Option<&str>) {
    let base = base_name(filename);
    match base.rfind('.') {
        Some(idx) if idx > 0 => (&base[..idx], Some(&base[idx + 1..])),
        _ => (base, None),
    }
}
