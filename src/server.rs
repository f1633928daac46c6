use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::HeaderValue,
    routing::{get, post},
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::TranscriptEntry;
use crate::chat::{self, ChatError};
use crate::config::Config;
use crate::extract_video_id;
use crate::store::TranscriptStore;
use crate::youtube::{self, CaptionsError};

const INVALID_URL_ERROR: &str = "Invalid YouTube URL";
const NO_TRANSCRIPT_ERROR: &str =
    "No transcript found for this video. The video may not have captions available.";
const VIDEO_UNAVAILABLE_ERROR: &str = "This video is unavailable or private.";
const TRANSCRIPT_NOT_FOUND_ERROR: &str = "Transcript not found. Please fetch the transcript first.";
const API_KEY_ERROR: &str =
    "OpenAI API key is missing or invalid. Please check the server configuration.";
const CONTEXT_LENGTH_ERROR: &str =
    "The transcript is too long to process. Please try a shorter video.";

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub store: TranscriptStore,
    pub client: reqwest::Client,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            store: TranscriptStore::new(),
            client: reqwest::Client::new(),
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub video_id: String,
    pub title: String,
    pub transcript: Vec<TranscriptEntry>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscriptResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            video_id: String::new(),
            title: String::new(),
            transcript: Vec::new(),
            success: false,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub video_id: String,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub timestamps: Vec<f64>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            response: String::new(),
            timestamps: Vec::new(),
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Build the application router with CORS applied to every route
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/", get(root))
        .route("/items/:item_id", get(read_item))
        .route("/api/transcript", post(fetch_transcript))
        .route("/api/chat", post(chat_about_video))
        .layer(cors)
        .with_state(state)
}

// Credentialed CORS cannot use wildcards, so methods and headers mirror
// whatever the preflight asked for.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({"Hello": "World"}))
}

#[derive(Debug, Deserialize)]
struct ItemQuery {
    q: Option<String>,
}

async fn read_item(
    Path(item_id): Path<i64>,
    Query(query): Query<ItemQuery>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({"item_id": item_id, "q": query.q}))
}

/// POST /api/transcript: fetch captions for a URL and remember them
async fn fetch_transcript(
    State(state): State<AppState>,
    Json(req): Json<TranscriptRequest>,
) -> Json<TranscriptResponse> {
    let Some(video_id) = extract_video_id(&req.url) else {
        info!("Rejected transcript request for unrecognized URL: {}", req.url);
        return Json(TranscriptResponse::failure(INVALID_URL_ERROR));
    };

    match youtube::fetch_captions(&state.client, &video_id).await {
        Ok(captions) => {
            let title = captions
                .title
                .unwrap_or_else(|| format!("Video {video_id}"));
            state.store.insert(video_id.clone(), captions.entries.clone());
            info!("Stored transcript for {video_id} ({} entries)", captions.entries.len());
            Json(TranscriptResponse {
                video_id,
                title,
                transcript: captions.entries,
                success: true,
                error: None,
            })
        }
        Err(err) => {
            error!("Transcript fetch for {video_id} failed: {err}");
            Json(TranscriptResponse::failure(transcript_error_message(&err)))
        }
    }
}

/// POST /api/chat: answer a question about a previously fetched transcript
async fn chat_about_video(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let Some(entries) = state.store.get(&req.video_id) else {
        info!("Chat requested for unknown video {}", req.video_id);
        return Json(ChatResponse::failure(TRANSCRIPT_NOT_FOUND_ERROR));
    };

    let api_key = state.config.openai_api_key.as_deref();
    match chat::answer_question(&state.client, api_key, &entries, &req.question).await {
        Ok(reply) => Json(ChatResponse {
            response: reply.answer,
            timestamps: reply.timestamps,
            success: true,
            error: None,
        }),
        Err(err) => {
            error!("Chat about {} failed: {err}", req.video_id);
            Json(ChatResponse::failure(chat_error_message(&err)))
        }
    }
}

fn transcript_error_message(err: &CaptionsError) -> String {
    match err {
        CaptionsError::NoCaptions => NO_TRANSCRIPT_ERROR.to_string(),
        CaptionsError::VideoUnavailable { .. } => VIDEO_UNAVAILABLE_ERROR.to_string(),
        other => format!("Failed to fetch transcript: {other}"),
    }
}

fn chat_error_message(err: &ChatError) -> String {
    match err {
        ChatError::MissingApiKey | ChatError::Auth(_) => API_KEY_ERROR.to_string(),
        ChatError::ContextLength(_) => CONTEXT_LENGTH_ERROR.to_string(),
        other => format!("Failed to answer the question: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(Config {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            openai_api_key: None,
        })
    }

    fn entry(text: &str, start: f64) -> TranscriptEntry {
        TranscriptEntry {
            text: text.to_string(),
            start,
            duration: 1.0,
        }
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_returns_hello_world() {
        let app = build_app(test_state());
        let req = Request::builder()
            .method("GET")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["Hello"], "World");
    }

    #[tokio::test]
    async fn test_read_item_echoes_id_and_query() {
        let app = build_app(test_state());
        let req = Request::builder()
            .method("GET")
            .uri("/items/42?q=somequery")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["item_id"], 42);
        assert_eq!(json["q"], "somequery");
    }

    #[tokio::test]
    async fn test_read_item_without_query() {
        let app = build_app(test_state());
        let req = Request::builder()
            .method("GET")
            .uri("/items/7")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let json = body_json(res).await;
        assert_eq!(json["item_id"], 7);
        assert_eq!(json["q"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_transcript_rejects_invalid_url() {
        let app = build_app(test_state());
        let req = post_json("/api/transcript", r#"{"url":"https://example.com/watch?v=abc"}"#);
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], INVALID_URL_ERROR);
        assert_eq!(json["transcript"], serde_json::json!([]));
        assert_eq!(json["video_id"], "");
    }

    #[tokio::test]
    async fn test_chat_unknown_video_short_circuits() {
        // With an empty store the lookup must fail before the model is ever
        // consulted; a reply mentioning the API key would mean it was not.
        let app = build_app(test_state());
        let req = post_json("/api/chat", r#"{"video_id":"missing","question":"what?"}"#);
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], TRANSCRIPT_NOT_FOUND_ERROR);
        assert_eq!(json["response"], "");
        assert_eq!(json["timestamps"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_chat_with_stored_transcript_but_no_key() {
        let state = test_state();
        state.store.insert("abc123", vec![entry("hello there", 0.0)]);
        let app = build_app(state);
        let req = post_json("/api/chat", r#"{"video_id":"abc123","question":"what is said?"}"#);
        let res = app.oneshot(req).await.unwrap();
        let json = body_json(res).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], API_KEY_ERROR);
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let app = build_app(test_state());
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/transcript")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:5173")
        );
        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .and_then(|v| v.to_str().ok()),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_cors_omits_unlisted_origin() {
        let app = build_app(test_state());
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/transcript")
            .header(header::ORIGIN, "https://evil.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn test_success_envelope_omits_error_field() {
        let resp = TranscriptResponse {
            video_id: "abc123".to_string(),
            title: "Video abc123".to_string(),
            transcript: vec![entry("hi", 0.0)],
            success: true,
            error: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["transcript"][0]["start"], 0.0);
    }

    #[test]
    fn test_failure_envelope_defaults_fields() {
        let resp = ChatResponse::failure(TRANSCRIPT_NOT_FOUND_ERROR);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["response"], "");
        assert_eq!(json["timestamps"], serde_json::json!([]));
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], TRANSCRIPT_NOT_FOUND_ERROR);
    }

    #[test]
    fn test_error_messages_by_caption_failure() {
        assert_eq!(
            transcript_error_message(&CaptionsError::NoCaptions),
            NO_TRANSCRIPT_ERROR
        );
        assert_eq!(
            transcript_error_message(&CaptionsError::VideoUnavailable {
                reason: "private".to_string()
            }),
            VIDEO_UNAVAILABLE_ERROR
        );
        let generic = transcript_error_message(&CaptionsError::ApiKeyNotFound);
        assert!(generic.starts_with("Failed to fetch transcript:"));
    }

    #[test]
    fn test_error_messages_by_chat_failure() {
        assert_eq!(chat_error_message(&ChatError::MissingApiKey), API_KEY_ERROR);
        assert_eq!(
            chat_error_message(&ChatError::Auth("bad key".to_string())),
            API_KEY_ERROR
        );
        assert_eq!(
            chat_error_message(&ChatError::ContextLength("too long".to_string())),
            CONTEXT_LENGTH_ERROR
        );
        let generic = chat_error_message(&ChatError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        assert!(generic.starts_with("Failed to answer the question:"));
    }
}
