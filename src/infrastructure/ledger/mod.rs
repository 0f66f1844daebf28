mod csv_ledger_store;
mod encoding_detection;

pub use csv_ledger_store::CsvLedgerStore;
pub use encoding_detection::{DETECTION_SAMPLE_BYTES, detect_encoding, detect_encoding_in_full};
