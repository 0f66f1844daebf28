use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// Bytes fed to the statistical detector on the first pass.
pub const DETECTION_SAMPLE_BYTES: usize = 64 * 1024;

/// Picks the character encoding of a persisted ledger from its leading bytes.
///
/// A byte-order mark wins outright. Otherwise a sample that is valid UTF-8 is
/// taken as UTF-8, and anything else goes through `chardetng`. A low-confidence
/// guess falls back to `fallback`.
pub fn detect_encoding(bytes: &[u8], fallback: &'static Encoding) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    let sample = &bytes[..bytes.len().min(DETECTION_SAMPLE_BYTES)];
    let is_last = sample.len() == bytes.len();

    match std::str::from_utf8(sample) {
        Ok(_) => return UTF_8,
        // Truncated in the middle of a multi-byte sequence
        Err(e) if !is_last && e.error_len().is_none() => return UTF_8,
        Err(_) => {}
    }

    guess_encoding(sample, is_last, fallback)
}

/// Second pass over the whole file, for when the sampled guess fails to decode
/// it cleanly. Never answers UTF-8 unless every byte is valid UTF-8.
pub fn detect_encoding_in_full(bytes: &[u8], fallback: &'static Encoding) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }

    match guess_encoding(bytes, true, fallback) {
        guess if guess == UTF_8 => fallback,
        guess => guess,
    }
}

fn guess_encoding(
    bytes: &[u8],
    is_last: bool,
    fallback: &'static Encoding,
) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, is_last);
    let (guess, confident) = detector.guess_assess(None, true);

    if confident {
        tracing::debug!(encoding = guess.name(), "Detected ledger encoding");
        guess
    } else {
        tracing::warn!(
            guess = guess.name(),
            fallback = fallback.name(),
            "Ledger encoding detection inconclusive, using default"
        );
        fallback
    }
}
