use crate::domain::{base_name, file_extension};

/// MIME type announced to transcription backends for a declared file name.
pub fn audio_mime_type(filename: &str) -> &'static str {
    match file_extension(filename).map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("mp3") | Some("mpga") | Some("mpeg") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

/// Name sent in the multipart form; backends sniff the container from it.
pub fn upload_file_name(filename: &str) -> String {
    let name = base_name(filename);
    if name.is_empty() {
        "audio.mp3".to_string()
    } else {
        name.to_string()
    }
}
