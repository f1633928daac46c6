use crate::ChatReply;

/// Strip a Markdown code fence from a raw model reply
///
/// Models often wrap the JSON they were asked for in a fence. A reply that
/// starts with ```` ```json ```` loses that opening token and a trailing
/// closing fence; a reply that starts with a bare ```` ``` ```` loses its
/// first and last lines when the last line is exactly a closing fence.
/// Anything else passes through. The result is trimmed either way.
pub fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(rest) = trimmed.strip_prefix("```json") {
        let rest = rest.strip_suffix("```").unwrap_or(rest);
        return rest.trim().to_string();
    }

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() >= 2 && lines[lines.len() - 1].trim() == "```" {
            return lines[1..lines.len() - 1].join("\n").trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Parse a sanitized reply into an answer plus cited timestamps
///
/// The model is instructed to reply with `{"answer": …, "timestamps": […]}`
/// but does not always comply. Missing keys fall back to defaults, and text
/// that is not JSON at all becomes the answer verbatim with no timestamps.
pub fn parse_reply(sanitized: &str) -> ChatReply {
    match serde_json::from_str::<serde_json::Value>(sanitized) {
        Ok(value) => {
            let answer = value
                .get("answer")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| sanitized.to_string());
            let timestamps = value
                .get("timestamps")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|t| t.as_f64()).collect())
                .unwrap_or_default();
            ChatReply { answer, timestamps }
        }
        Err(_) => ChatReply {
            answer: sanitized.to_string(),
            timestamps: Vec::new(),
        },
    }
}
