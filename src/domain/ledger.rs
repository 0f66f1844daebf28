use std::collections::HashMap;

use super::{CallId, CallRecord};

pub const CALL_ID_COLUMN: &str = "Call ID";
pub const TRANSCRIPT_COLUMN: &str = "Call Transcript";
pub const CLASSIFICATION_COLUMN: &str = "Classification";

pub const REQUIRED_COLUMNS: [&str; 3] = [CALL_ID_COLUMN, TRANSCRIPT_COLUMN, CLASSIFICATION_COLUMN];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// In-memory table of processed calls, keyed by call id.
///
/// Columns other than the three required ones are carried through untouched,
/// as are rows no upsert refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    call_id_col: usize,
    transcript_col: usize,
    classification_col: usize,
    index: HashMap<String, Vec<usize>>,
}

impl Ledger {
    pub fn empty() -> Self {
        Self::from_table(Vec::new(), Vec::new())
    }

    /// Builds a ledger from raw headers and rows. Missing required columns are
    /// appended; short rows are padded with empty cells. When an id appears on
    /// several rows, upserts rewrite all of them so no stale copy survives.
    pub fn from_table(mut headers: Vec<String>, mut rows: Vec<Vec<String>>) -> Self {
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                headers.push(column.to_string());
            }
        }

        let call_id_col = column_position(&headers, CALL_ID_COLUMN);
        let transcript_col = column_position(&headers, TRANSCRIPT_COLUMN);
        let classification_col = column_position(&headers, CLASSIFICATION_COLUMN);

        let mut index: HashMap<String, Vec<usize>> = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter_mut().enumerate() {
            if row.len() < headers.len() {
                row.resize(headers.len(), String::new());
            }
            index.entry(row[call_id_col].clone()).or_default().push(i);
        }

        let duplicated = index.values().filter(|rows| rows.len() > 1).count();
        if duplicated > 0 {
            tracing::warn!(
                duplicated_ids = duplicated,
                "Ledger holds repeated call ids; upserts will rewrite every copy"
            );
        }

        Self {
            headers,
            rows,
            call_id_col,
            transcript_col,
            classification_col,
            index,
        }
    }

    pub fn upsert(&mut self, record: &CallRecord) -> UpsertOutcome {
        if let Some(positions) = self.index.get(record.call_id.as_str()) {
            for &i in positions {
                let row = &mut self.rows[i];
                row[self.transcript_col] = record.transcript.clone();
                row[self.classification_col] = record.classification.clone();
            }
            return UpsertOutcome::Updated;
        }

        let mut row = vec![String::new(); self.headers.len()];
        row[self.call_id_col] = record.call_id.as_str().to_string();
        row[self.transcript_col] = record.transcript.clone();
        row[self.classification_col] = record.classification.clone();

        self.index
            .insert(record.call_id.as_str().to_string(), vec![self.rows.len()]);
        self.rows.push(row);
        UpsertOutcome::Inserted
    }

    pub fn get(&self, call_id: &CallId) -> Option<CallRecord> {
        self.index
            .get(call_id.as_str())
            .and_then(|positions| positions.first())
            .map(|&i| self.record_at(i))
    }

    /// Number of call ids that occupy more than one row.
    pub fn duplicate_ids(&self) -> usize {
        self.index.values().filter(|rows| rows.len() > 1).count()
    }

    pub fn records(&self) -> impl Iterator<Item = CallRecord> + '_ {
        (0..self.rows.len()).map(|i| self.record_at(i))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn record_at(&self, i: usize) -> CallRecord {
        let row = &self.rows[i];
        CallRecord::new(
            CallId::new(row[self.call_id_col].clone()),
            row[self.transcript_col].clone(),
            row[self.classification_col].clone(),
        )
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::empty()
    }
}

fn column_position(headers: &[String], column: &str) -> usize {
    headers.iter().position(|h| h == column).unwrap_or(0)
}
