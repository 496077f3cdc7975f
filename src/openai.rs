//! OpenAI collaborators: realtime voice sessions, interview question
//! generation, and Whisper transcription over the REST API.

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::OpenAiConfig;
use crate::constants::{COMPLETION_MODEL, REALTIME_MODEL, REALTIME_VOICE, TRANSCRIPTION_MODEL};
use crate::coordinator::{CompletionApi, RealtimeSessionApi, TranscriptionApi};
use crate::error::AppError;

const DEFAULT_API_BASE: &str = "https://api.openai.com";

pub struct OpenAiClient {
    api_key: Option<String>,
    api_base: String,
    client: Client,
}

impl OpenAiClient {
    /// Build a client from config. A missing key falls back to the
    /// OPENAI_API_KEY environment variable; absence is only reported when
    /// a request is attempted.
    pub fn new(config: &OpenAiConfig) -> Self {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        Self {
            api_key,
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            client: Client::new(),
        }
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Upstream("OpenAI API key not configured".to_string()))
    }

    async fn read_json(response: reqwest::Response, what: &str) -> Result<Value, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} failed (HTTP {}): {}", what, status, body);
            return Err(AppError::Upstream(format!(
                "{} failed (HTTP {})",
                what, status
            )));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Upstream(format!("{}: invalid response: {}", what, e)))
    }
}

#[async_trait]
impl RealtimeSessionApi for OpenAiClient {
    async fn create_session(&self, instructions: &str) -> Result<Value, AppError> {
        let api_key = self.api_key()?;
        let body = json!({
            "model": REALTIME_MODEL,
            "voice": REALTIME_VOICE,
            "instructions": instructions,
        });

        let response = self
            .client
            .post(format!("{}/v1/realtime/sessions", self.api_base))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        Self::read_json(response, "realtime session request").await
    }
}

#[async_trait]
impl CompletionApi for OpenAiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, AppError> {
        let api_key = self.api_key()?;
        let body = json!({
            "model": COMPLETION_MODEL,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "temperature": temperature,
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let data = Self::read_json(response, "completion request").await?;
        data["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AppError::Upstream("completion response missing message content".to_string())
            })
    }
}

#[async_trait]
impl TranscriptionApi for OpenAiClient {
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> Result<String, AppError> {
        let api_key = self.api_key()?;

        let file_part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str("audio/wav")
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", TRANSCRIPTION_MODEL);

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.api_base))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let data = Self::read_json(response, "transcription request").await?;
        data.get("text")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Upstream("transcription response missing text".to_string()))
    }
}
