use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;

use interview_server::coordinator::{
    CompletionApi, RealtimeSessionApi, SessionCoordinator, TelephonyApi, TranscriptionApi,
};
use interview_server::db;
use interview_server::error::AppError;
use interview_server::store::{ConversationTurn, QaTurn, SessionStore};

// ============================================================================
// Scripted collaborators
// ============================================================================

struct ScriptedRealtime {
    payload: Value,
}

#[async_trait]
impl RealtimeSessionApi for ScriptedRealtime {
    async fn create_session(&self, _instructions: &str) -> Result<Value, AppError> {
        Ok(self.payload.clone())
    }
}

struct FailingRealtime;

#[async_trait]
impl RealtimeSessionApi for FailingRealtime {
    async fn create_session(&self, _instructions: &str) -> Result<Value, AppError> {
        Err(AppError::Upstream("connection refused".to_string()))
    }
}

struct ScriptedCompletion {
    reply: String,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedCompletion {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionApi for ScriptedCompletion {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _temperature: f32,
    ) -> Result<String, AppError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        Ok(self.reply.clone())
    }
}

struct ScriptedTranscriber {
    text: String,
    received: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedTranscriber {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            received: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TranscriptionApi for ScriptedTranscriber {
    async fn transcribe(&self, audio: &[u8], _file_name: &str) -> Result<String, AppError> {
        self.received.lock().unwrap().push(audio.to_vec());
        Ok(self.text.clone())
    }
}

struct ScriptedTelephony {
    sid: String,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedTelephony {
    fn new(sid: &str) -> Self {
        Self {
            sid: sid.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TelephonyApi for ScriptedTelephony {
    async fn start_recorded_call(&self, to: &str, language: &str) -> Result<String, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((to.to_string(), language.to_string()));
        Ok(self.sid.clone())
    }
}

struct Harness {
    coordinator: SessionCoordinator,
    pool: SqlitePool,
    completion: Arc<ScriptedCompletion>,
    transcriber: Arc<ScriptedTranscriber>,
    telephony: Arc<ScriptedTelephony>,
    recordings_dir: TempDir,
}

async fn harness() -> Harness {
    harness_with_realtime(Arc::new(ScriptedRealtime {
        payload: json!({"id": "sess_1", "client_secret": {"value": "ek_test"}}),
    }))
    .await
}

async fn harness_with_realtime(realtime: Arc<dyn RealtimeSessionApi>) -> Harness {
    let pool = db::open_in_memory().await;
    let completion = Arc::new(ScriptedCompletion::new(
        "Hi, nice to meet you! What motivated you to apply?",
    ));
    let transcriber = Arc::new(ScriptedTranscriber::new("transcribed text"));
    let telephony = Arc::new(ScriptedTelephony::new("CA123"));
    let recordings_dir = TempDir::new().unwrap();

    let coordinator = SessionCoordinator::new(
        SessionStore::new(pool.clone()),
        realtime,
        completion.clone(),
        transcriber.clone(),
        telephony.clone(),
        recordings_dir.path().to_path_buf(),
        "http://localhost:8000".to_string(),
    );

    Harness {
        coordinator,
        pool,
        completion,
        transcriber,
        telephony,
        recordings_dir,
    }
}

// ============================================================================
// create_session
// ============================================================================

#[tokio::test]
async fn create_session_injects_candidate_id() {
    let h = harness().await;

    let payload = h.coordinator.create_session("en").await.unwrap();

    assert_eq!(payload["id"], "sess_1");
    let candidate_id = payload["candidate_id"].as_str().unwrap();
    assert_eq!(candidate_id.len(), 16);
    assert!(candidate_id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn create_session_ids_differ_per_call() {
    let h = harness().await;
    let first = h.coordinator.create_session("en").await.unwrap();
    let second = h.coordinator.create_session("en").await.unwrap();
    assert_ne!(first["candidate_id"], second["candidate_id"]);
}

#[tokio::test]
async fn create_session_reports_upstream_failure() {
    let h = harness_with_realtime(Arc::new(FailingRealtime)).await;
    let err = h.coordinator.create_session("en").await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));
}

// ============================================================================
// next_question
// ============================================================================

#[tokio::test]
async fn first_question_uses_greeting_prompt() {
    let h = harness().await;

    let question = h.coordinator.next_question("abc123", None).await.unwrap();
    assert_eq!(question, "Hi, nice to meet you! What motivated you to apply?");

    let prompts = h.completion.prompts.lock().unwrap();
    let (system, user) = &prompts[0];
    assert!(system.contains("HR interviewer"));
    assert!(user.contains("greeting"));
    assert!(user.contains("first interview question"));
}

#[tokio::test]
async fn follow_up_question_embeds_last_answer() {
    let h = harness().await;

    h.coordinator
        .next_question("abc123", Some("I love this field"))
        .await
        .unwrap();

    let prompts = h.completion.prompts.lock().unwrap();
    let (_, user) = &prompts[0];
    assert!(user.contains("'I love this field'"));
    assert!(user.contains("Acknowledge it politely"));
}

#[tokio::test]
async fn empty_last_answer_is_treated_as_absent() {
    let h = harness().await;

    h.coordinator.next_question("abc123", Some("")).await.unwrap();

    let prompts = h.completion.prompts.lock().unwrap();
    assert!(prompts[0].1.contains("greeting"));
}

// ============================================================================
// complete_session
// ============================================================================

#[tokio::test]
async fn complete_session_persists_transcribes_and_finalizes() {
    let h = harness().await;
    let audio: Vec<u8> = (0u8..=255).cycle().take(1024).collect();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&audio);

    let completed = h
        .coordinator
        .complete_session(
            Some("abc123"),
            &encoded,
            &[ConversationTurn {
                question: Some("Q".to_string()),
                answer: Some("A".to_string()),
            }],
        )
        .await
        .unwrap();

    assert_eq!(completed.candidate_id, "abc123");
    assert_eq!(completed.transcription, "transcribed text");
    assert_eq!(
        completed.conversation.last(),
        Some(&QaTurn::Transcription {
            transcription: "transcribed text".to_string()
        })
    );

    // The transcriber received the decoded bytes bit-for-bit.
    let received = h.transcriber.received.lock().unwrap();
    assert_eq!(received[0], audio);

    // The recording landed on disk under the candidate/timestamp name.
    let entries: Vec<_> = std::fs::read_dir(h.recordings_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].starts_with("abc123_"));
    assert!(entries[0].ends_with(".wav"));
    assert_eq!(
        completed.recording_url,
        format!("http://localhost:8000/recordings/{}", entries[0])
    );

    // And the finalized row exists.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recordings WHERE candidate_id = 'abc123'")
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn complete_session_generates_candidate_id_when_missing() {
    let h = harness().await;
    let encoded = base64::engine::general_purpose::STANDARD.encode(b"audio");

    let completed = h.coordinator.complete_session(None, &encoded, &[]).await.unwrap();
    assert_eq!(completed.candidate_id.len(), 16);
}

#[tokio::test]
async fn complete_session_rejects_missing_recording() {
    let h = harness().await;
    let err = h.coordinator.complete_session(Some("abc123"), "", &[]).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn complete_session_rejects_malformed_base64_before_any_write() {
    let h = harness().await;

    let err = h
        .coordinator
        .complete_session(Some("abc123"), "@@not-base64@@", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Decoding(_)));

    // Nothing persisted, nothing transcribed.
    assert!(h.transcriber.received.lock().unwrap().is_empty());
    assert_eq!(std::fs::read_dir(h.recordings_dir.path()).unwrap().count(), 0);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recordings")
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

// ============================================================================
// Telephony
// ============================================================================

#[tokio::test]
async fn place_call_returns_provider_sid_and_records_no_state() {
    let h = harness().await;

    let sid = h.coordinator.place_call("+15551234567", "en").await.unwrap();
    assert_eq!(sid, "CA123");
    assert_eq!(
        h.telephony.calls.lock().unwrap()[0],
        ("+15551234567".to_string(), "en".to_string())
    );

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recordings")
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn place_call_requires_a_number() {
    let h = harness().await;
    let err = h.coordinator.place_call("", "en").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn inbound_recording_is_keyed_by_caller_number() {
    let h = harness().await;

    h.coordinator
        .handle_inbound_recording("+15557654321", "https://api.twilio.com/rec/RE9")
        .await
        .unwrap();

    let row = h
        .coordinator
        .store()
        .find_latest("+15557654321")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        row.recording_url.as_deref(),
        Some("https://api.twilio.com/rec/RE9")
    );
    assert!(row.qa_turns.is_empty());
}

#[tokio::test]
async fn inbound_recording_requires_both_fields() {
    let h = harness().await;
    let err = h
        .coordinator
        .handle_inbound_recording("", "https://api.twilio.com/rec/RE9")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
