pub mod chat;
pub mod config;
pub mod sanitize;
pub mod server;
pub mod store;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// A single caption line with its start time and duration, in seconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// An answer distilled from the model's reply, plus the timestamps it cited
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub answer: String,
    pub timestamps: Vec<f64>,
}

// The known URL shapes, tried in order; the first capturing-group match wins.
static VIDEO_ID_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"youtube\.com/watch\?(?:.*&)?v=([a-zA-Z0-9_-]+)").unwrap(),
        Regex::new(r"youtu\.be/([a-zA-Z0-9_-]+)").unwrap(),
        Regex::new(r"youtube\.com/embed/([a-zA-Z0-9_-]+)").unwrap(),
    ]
});

/// Extract the video ID from a YouTube URL
///
/// Recognizes `watch?v=`, `youtu.be/` and `embed/` URLs. The capture stops
/// at the first character that cannot appear in an ID, so trailing query
/// parameters never leak into the result. Returns `None` for anything else.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url).map(|caps| caps[1].to_string()))
}
