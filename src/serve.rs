use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::coordinator::SessionCoordinator;
use crate::db;
use crate::error::AppError;
use crate::openai::OpenAiClient;
use crate::store::{ConversationTurn, SessionStore};
use crate::twilio::TwilioClient;

// State for the interview handlers
pub struct AppState {
    pub coordinator: SessionCoordinator,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Map the error taxonomy onto HTTP statuses and a JSON error payload.
fn error_response(what: &str, err: AppError) -> Response {
    let status = match &err {
        AppError::Validation(_) | AppError::Decoding(_) => StatusCode::BAD_REQUEST,
        AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        AppError::Database(_) | AppError::Storage(_) | AppError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        error!("{} failed: {}", what, err);
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    #[serde(default = "default_language")]
    language: String,
}

/// GET /session?language=en
async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Response {
    match state.coordinator.create_session(&query.language).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(e) => error_response("Session creation", e),
    }
}

#[derive(Debug, Deserialize)]
struct NextQuestionQuery {
    candidate_id: String,
    last_answer: Option<String>,
}

/// GET /get_next_question?candidate_id=..&last_answer=..
async fn next_question_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NextQuestionQuery>,
) -> Response {
    match state
        .coordinator
        .next_question(&query.candidate_id, query.last_answer.as_deref())
        .await
    {
        Ok(question) => (StatusCode::OK, Json(json!({ "question": question }))).into_response(),
        Err(e) => error_response("Question generation", e),
    }
}

#[derive(Debug, Deserialize)]
struct SaveQaRequest {
    candidate_id: Option<String>,
    question: Option<String>,
    answer: Option<String>,
    #[serde(default)]
    generated_questions: Vec<String>,
}

/// POST /save_qa
///
/// Fields stay optional at the deserialization layer so that a missing
/// field reports the store's ValidationError instead of a rejected body.
async fn save_qa_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveQaRequest>,
) -> Response {
    let result = state
        .coordinator
        .store()
        .append_turn(
            request.candidate_id.as_deref().unwrap_or(""),
            request.question.as_deref().unwrap_or(""),
            request.answer.as_deref().unwrap_or(""),
            &request.generated_questions,
        )
        .await;

    match result {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "success" }))).into_response(),
        Err(e) => error_response("Q&A save", e),
    }
}

#[derive(Debug, Deserialize)]
struct CompleteSessionRequest {
    candidate_id: Option<String>,
    recording_base64: Option<String>,
    #[serde(default)]
    conversation: Vec<ConversationTurn>,
}

/// POST /session/complete
async fn complete_session_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompleteSessionRequest>,
) -> Response {
    let recording_base64 = request.recording_base64.as_deref().unwrap_or("");

    match state
        .coordinator
        .complete_session(
            request.candidate_id.as_deref(),
            recording_base64,
            &request.conversation,
        )
        .await
    {
        Ok(completed) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "candidate_id": completed.candidate_id,
                "recording_url": completed.recording_url,
                "transcription": completed.transcription,
                "conversation": completed.conversation,
            })),
        )
            .into_response(),
        Err(e) => error_response("Session completion", e),
    }
}

#[derive(Debug, Deserialize)]
struct CallQuery {
    to: String,
    #[serde(default = "default_language")]
    language: String,
}

/// POST /call?to=..&language=..
async fn place_call_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallQuery>,
) -> Response {
    match state
        .coordinator
        .place_call(&query.to, &query.language)
        .await
    {
        Ok(call_sid) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "call_sid": call_sid })),
        )
            .into_response(),
        Err(e) => error_response("Outbound call", e),
    }
}

#[derive(Debug, Deserialize)]
struct RecordingCallbackForm {
    #[serde(rename = "RecordingUrl")]
    recording_url: Option<String>,
    #[serde(rename = "From")]
    from: Option<String>,
}

/// POST /twilio/recording (form-encoded provider callback)
async fn recording_callback_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RecordingCallbackForm>,
) -> Response {
    match state
        .coordinator
        .handle_inbound_recording(
            form.from.as_deref().unwrap_or(""),
            form.recording_url.as_deref().unwrap_or(""),
        )
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "success" }))).into_response(),
        Err(e) => error_response("Recording callback", e),
    }
}

/// Assemble the router: the six interview routes, static serving of the
/// recordings directory, and a permissive CORS layer.
pub fn build_router(state: Arc<AppState>, recordings_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/session", get(create_session_handler))
        .route("/get_next_question", get(next_question_handler))
        .route("/save_qa", post(save_qa_handler))
        .route("/session/complete", post(complete_session_handler))
        .route("/call", post(place_call_handler))
        .route("/twilio/recording", post(recording_callback_handler))
        .nest_service("/recordings", ServeDir::new(recordings_dir))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server: open the database, build the collaborators and
/// the coordinator, then listen until shutdown.
pub fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.recordings_dir).map_err(|e| {
        format!(
            "Failed to create recordings directory '{}': {}",
            config.recordings_dir.display(),
            e
        )
    })?;
    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let pool = db::open_database(&config.database_path).await?;
        db::init_schema(&pool).await?;

        let openai = Arc::new(OpenAiClient::new(&config.openai));
        let twilio = Arc::new(TwilioClient::new(&config.twilio));
        let coordinator = SessionCoordinator::new(
            SessionStore::new(pool),
            openai.clone(),
            openai.clone(),
            openai,
            twilio,
            config.recordings_dir.clone(),
            config.public_base_url.clone(),
        );

        let app = build_router(Arc::new(AppState { coordinator }), &config.recordings_dir);

        log::info!("Listening on: http://[::]:{}", config.port);
        let listener = tokio::net::TcpListener::bind(format!("[::]:{}", config.port))
            .await
            .map_err(|e| format!("Failed to bind to port {}: {}", config.port, e))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
