use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::{ChatReply, TranscriptEntry, sanitize};

const MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f64 = 0.3;
const MAX_TOKENS: u32 = 1000;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about a video using only its transcript. \
Base every answer on the transcript content alone and cite the timestamps (in seconds) of the lines that support it. \
Respond with a JSON object with two keys: \"answer\" (a string) and \"timestamps\" (an array of numbers). \
Do not include any text outside the JSON object.";

/// Completion failures, classified at the provider boundary
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("API key rejected: {0}")]
    Auth(String),
    #[error("transcript exceeds the model's context window: {0}")]
    ContextLength(String),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected completion response format")]
    MalformedResponse,
}

/// Render a transcript to one timestamped line per entry, in stored order
pub fn format_transcript(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("[{:.1}s] {}", e.start, e.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn user_message(transcript: &str, question: &str) -> String {
    format!("Transcript:\n{transcript}\n\nQuestion: {question}")
}

/// Answer a question about a transcript with a single-turn completion request
///
/// The reply is fence-stripped and parsed into an answer plus cited
/// timestamps; replies that are not the requested JSON degrade to a bare
/// answer rather than an error.
pub async fn answer_question(
    client: &reqwest::Client,
    api_key: Option<&str>,
    entries: &[TranscriptEntry],
    question: &str,
) -> Result<ChatReply, ChatError> {
    let api_key = api_key.ok_or(ChatError::MissingApiKey)?;

    debug!("Asking {MODEL} about a transcript with {} entries", entries.len());

    let transcript = format_transcript(entries);
    let body = serde_json::json!({
        "model": MODEL,
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
        "messages": [
            {
                "role": "system",
                "content": SYSTEM_PROMPT
            },
            {
                "role": "user",
                "content": user_message(&transcript, question)
            }
        ]
    });

    let resp = client
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(classify_api_error(status, &body));
    }

    let json: serde_json::Value = resp.json().await?;
    let raw = extract_completion_text(&json).ok_or(ChatError::MalformedResponse)?;

    Ok(sanitize::parse_reply(&sanitize::strip_code_fence(&raw)))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

// Error bodies look like {"error": {"message": …, "type": …, "code": …}};
// plain-text bodies classify by HTTP status alone.
fn classify_api_error(status: u16, body: &str) -> ChatError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_default();
    let message = match detail.message {
        Some(m) if !m.is_empty() => m,
        _ => body.to_string(),
    };

    if matches!(status, 401 | 403) || detail.code.as_deref() == Some("invalid_api_key") {
        return ChatError::Auth(message);
    }
    if detail.code.as_deref() == Some("context_length_exceeded")
        || message.contains("maximum context length")
    {
        return ChatError::ContextLength(message);
    }
    ChatError::Api { status, message }
}

fn extract_completion_text(json: &serde_json::Value) -> Option<String> {
    json.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}
