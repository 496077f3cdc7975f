use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use log::info;
use serde::Serialize;
use serde_json::Value;

use crate::constants::generate_candidate_id;
use crate::error::AppError;
use crate::store::{ConversationTurn, QaTurn, SessionStore};

/// Creates realtime voice sessions with the AI provider.
#[async_trait]
pub trait RealtimeSessionApi: Send + Sync {
    /// Returns the provider's opaque session descriptor.
    async fn create_session(&self, instructions: &str) -> Result<Value, AppError>;
}

/// Generates one interview utterance from a prompt pair.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, AppError>;
}

/// Turns recorded audio into text.
#[async_trait]
pub trait TranscriptionApi: Send + Sync {
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> Result<String, AppError>;
}

/// Places outbound phone calls.
#[async_trait]
pub trait TelephonyApi: Send + Sync {
    /// Returns the provider call identifier.
    async fn start_recorded_call(&self, to: &str, language: &str) -> Result<String, AppError>;
}

const INTERVIEWER_SYSTEM_PROMPT: &str =
    "You are a friendly HR interviewer conducting an online interview.";

const OPENING_PROMPT: &str =
    "You are an AI recruiter. Start the interview with a short friendly greeting \
     like 'Hi, nice to meet you!' and then follow up with your first interview question.";

const INSTRUCTIONS_EN: &str =
    "You are an interviewer. Ask questions in English and conduct the full interview in English.";

const INSTRUCTIONS_HI: &str =
    "आप एक इंटरव्यूअर हैं। उम्मीदवार से केवल हिंदी में प्रश्न पूछें और सभी बातचीत हिंदी में करें।";

/// Instruction preset for the requested spoken language.
/// Unrecognized codes fall back to English.
pub fn instructions_for_language(language: &str) -> &'static str {
    match language {
        "hi" => INSTRUCTIONS_HI,
        _ => INSTRUCTIONS_EN,
    }
}

/// Decode the base64 transport encoding of a recording.
pub fn decode_recording(recording_base64: &str) -> Result<Vec<u8>, AppError> {
    base64::engine::general_purpose::STANDARD
        .decode(recording_base64)
        .map_err(|e| AppError::Decoding(e.to_string()))
}

/// Everything a finished session reports back to the caller.
#[derive(Debug, Serialize)]
pub struct CompletedSession {
    pub candidate_id: String,
    pub recording_url: String,
    pub transcription: String,
    pub conversation: Vec<QaTurn>,
}

/// Sequences calls to the external collaborators and the session store.
/// Stateless between calls: all state lives in the store and in the
/// provider's session token. Collaborators are injected so tests can
/// substitute them.
pub struct SessionCoordinator {
    store: SessionStore,
    realtime: Arc<dyn RealtimeSessionApi>,
    completions: Arc<dyn CompletionApi>,
    transcription: Arc<dyn TranscriptionApi>,
    telephony: Arc<dyn TelephonyApi>,
    recordings_dir: PathBuf,
    public_base_url: String,
}

impl SessionCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: SessionStore,
        realtime: Arc<dyn RealtimeSessionApi>,
        completions: Arc<dyn CompletionApi>,
        transcription: Arc<dyn TranscriptionApi>,
        telephony: Arc<dyn TelephonyApi>,
        recordings_dir: PathBuf,
        public_base_url: String,
    ) -> Self {
        Self {
            store,
            realtime,
            completions,
            transcription,
            telephony,
            recordings_dir,
            public_base_url,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Create a realtime voice session and inject a fresh candidate id
    /// into the provider's payload.
    pub async fn create_session(&self, language: &str) -> Result<Value, AppError> {
        let candidate_id = generate_candidate_id();
        let instructions = instructions_for_language(language);

        let mut payload = self.realtime.create_session(instructions).await?;
        match payload.as_object_mut() {
            Some(object) => {
                object.insert("candidate_id".to_string(), Value::String(candidate_id));
            }
            None => {
                return Err(AppError::Upstream(
                    "realtime session response is not a JSON object".to_string(),
                ));
            }
        }
        Ok(payload)
    }

    /// Ask the completion collaborator for the next utterance: an opening
    /// greeting plus first question when there is no prior answer, or an
    /// acknowledgment of the last answer plus a follow-up.
    pub async fn next_question(
        &self,
        _candidate_id: &str,
        last_answer: Option<&str>,
    ) -> Result<String, AppError> {
        let prompt = match last_answer {
            None | Some("") => OPENING_PROMPT.to_string(),
            Some(answer) => format!(
                "You are an AI recruiter continuing a job interview. The candidate last said: '{}'. \
                 Acknowledge it politely (like 'Thanks for sharing!') and then ask the next relevant question.",
                answer
            ),
        };

        let question = self
            .completions
            .complete(INTERVIEWER_SYSTEM_PROMPT, &prompt, 0.8)
            .await?;
        Ok(question.trim().to_string())
    }

    /// Decode and persist the recording, transcribe it, and finalize the
    /// session record as one unit. A missing candidate id gets a fresh
    /// one. No compensation: a failure anywhere fails the whole
    /// operation with whatever was already written left in place.
    pub async fn complete_session(
        &self,
        candidate_id: Option<&str>,
        recording_base64: &str,
        conversation: &[ConversationTurn],
    ) -> Result<CompletedSession, AppError> {
        if recording_base64.is_empty() {
            return Err(AppError::Validation(
                "recording_base64 is required".to_string(),
            ));
        }
        let candidate_id = match candidate_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => generate_candidate_id(),
        };

        let audio = decode_recording(recording_base64)?;

        let file_name = format!("{}_{}.wav", candidate_id, Utc::now().format("%Y%m%d%H%M%S"));
        tokio::fs::write(self.recordings_dir.join(&file_name), &audio).await?;
        let recording_url = format!("{}/recordings/{}", self.public_base_url, file_name);

        let transcription = self.transcription.transcribe(&audio, &file_name).await?;
        let transcription = transcription.trim().to_string();

        let conversation = self
            .store
            .finalize_with_recording(&candidate_id, &recording_url, conversation, &transcription)
            .await?;

        info!(
            "Completed session for candidate {}: {}",
            candidate_id, recording_url
        );

        Ok(CompletedSession {
            candidate_id,
            recording_url,
            transcription,
            conversation,
        })
    }

    /// Trigger an outbound interview call. No local state is recorded
    /// until the provider's recording callback arrives.
    pub async fn place_call(&self, to: &str, language: &str) -> Result<String, AppError> {
        if to.is_empty() {
            return Err(AppError::Validation("to is required".to_string()));
        }
        self.telephony.start_recorded_call(to, language).await
    }

    /// Provider recording callback: the caller's number becomes the
    /// candidate id.
    pub async fn handle_inbound_recording(
        &self,
        from_number: &str,
        recording_url: &str,
    ) -> Result<(), AppError> {
        if from_number.is_empty() || recording_url.is_empty() {
            return Err(AppError::Validation(
                "RecordingUrl and From are required".to_string(),
            ));
        }
        self.store
            .record_inbound_call(from_number, recording_url)
            .await
    }
}
