use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use encoding_rs::Encoding;

use super::encoding_detection::{detect_encoding, detect_encoding_in_full};
use crate::application::ports::{LedgerStore, LedgerStoreError};
use crate::domain::Ledger;

/// Ledger persisted as a CSV file. Reads any encoding it can detect; always
/// writes UTF-8.
pub struct CsvLedgerStore {
    path: PathBuf,
    default_encoding: &'static Encoding,
}

impl CsvLedgerStore {
    pub fn new(path: impl Into<PathBuf>, default_encoding: &'static Encoding) -> Self {
        Self {
            path: path.into(),
            default_encoding,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LedgerStore for CsvLedgerStore {
    async fn load(&self) -> Result<Ledger, LedgerStoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No ledger on disk, starting empty");
                return Ok(Ledger::empty());
            }
            Err(e) => {
                return Err(LedgerStoreError::ReadFailed(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if bytes.is_empty() {
            return Ok(Ledger::empty());
        }

        let text = decode_ledger(&bytes, self.default_encoding)?;
        parse_ledger(&text)
    }

    async fn save(&self, ledger: &Ledger) -> Result<(), LedgerStoreError> {
        let data = serialize_ledger(ledger)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &data))
            .await
            .map_err(|e| LedgerStoreError::WriteFailed(format!("writer task: {}", e)))??;

        tracing::debug!(path = %self.path.display(), rows = ledger.len(), "Ledger written");
        Ok(())
    }
}

/// Decodes the whole file without substituting any byte. A replacement
/// character would be written back on the next save, so a file that cannot be
/// decoded cleanly is refused instead.
fn decode_ledger(
    bytes: &[u8],
    fallback: &'static Encoding,
) -> Result<String, LedgerStoreError> {
    let sampled = detect_encoding(bytes, fallback);
    if let Some(text) = sampled.decode_without_bom_handling_and_without_replacement(
        strip_bom(bytes, sampled),
    ) {
        return Ok(text.into_owned());
    }

    let full = detect_encoding_in_full(bytes, fallback);
    tracing::warn!(
        sampled = sampled.name(),
        detected = full.name(),
        "Ledger does not decode as its sampled encoding, re-detected over the whole file"
    );

    full.decode_without_bom_handling_and_without_replacement(strip_bom(bytes, full))
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            LedgerStoreError::Malformed(format!(
                "bytes invalid for every candidate encoding ({}, {})",
                sampled.name(),
                full.name()
            ))
        })
}

fn strip_bom<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> &'a [u8] {
    match Encoding::for_bom(bytes) {
        Some((bom_encoding, len)) if bom_encoding == encoding => &bytes[len..],
        _ => bytes,
    }
}

fn parse_ledger(text: &str) -> Result<Ledger, LedgerStoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LedgerStoreError::Malformed(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let rows = reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect::<Vec<_>>())
                .map_err(|e| LedgerStoreError::Malformed(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Ledger::from_table(headers, rows))
}

fn serialize_ledger(ledger: &Ledger) -> Result<Vec<u8>, LedgerStoreError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    let write_err = |e: csv::Error| LedgerStoreError::WriteFailed(e.to_string());
    writer.write_record(ledger.headers()).map_err(write_err)?;
    for row in ledger.rows() {
        writer.write_record(row).map_err(write_err)?;
    }

    writer
        .into_inner()
        .map_err(|e| LedgerStoreError::WriteFailed(e.to_string()))
}

/// Writes to a sibling temp file, syncs it, then renames it over `path`.
fn write_atomically(path: &Path, data: &[u8]) -> Result<(), LedgerStoreError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| LedgerStoreError::WriteFailed(format!("{}: {}", path.display(), e.error)))?;
    Ok(())
}
