use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::error::AppError;
use crate::queries::recordings;

/// One entry in a session's qa_data list.
///
/// Two shapes coexist in the same JSON array: structured question/answer
/// exchanges captured live, and a single trailing transcription marker
/// added at finalization. Variant order matters for untagged
/// deserialization: a transcription object must be tried first, because
/// `Exchange` has only optional fields and would match anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QaTurn {
    Transcription {
        transcription: String,
    },
    Exchange {
        question: Option<String>,
        answer: Option<String>,
    },
}

/// Incoming conversation turn from the client, before filtering.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationTurn {
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl ConversationTurn {
    /// True when both fields are absent or empty. Finalization drops
    /// these turns.
    fn is_blank(&self) -> bool {
        self.question.as_deref().unwrap_or("").is_empty()
            && self.answer.as_deref().unwrap_or("").is_empty()
    }
}

/// A persisted candidate-session row.
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub id: i64,
    pub candidate_id: String,
    pub recording_url: Option<String>,
    pub created_at_ms: i64,
    pub qa_turns: Vec<QaTurn>,
    pub generated_questions: Vec<String>,
}

/// Durable storage of candidate-session rows. No in-memory cache: every
/// operation round-trips to SQLite.
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recently created row for the candidate, or None.
    /// Ordered by created_at with the row id as secondary key so the
    /// append target is deterministic under same-millisecond inserts.
    pub async fn find_latest(&self, candidate_id: &str) -> Result<Option<SessionRow>, AppError> {
        let sql = recordings::select_latest_for_candidate(candidate_id);
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

        row.map(|row| {
            let qa_json: String = row.try_get("qa_data")?;
            let generated_json: String = row.try_get("generated_questions")?;
            Ok(SessionRow {
                id: row.try_get("id")?,
                candidate_id: row.try_get("candidate_id")?,
                recording_url: row.try_get("recording_url")?,
                created_at_ms: row.try_get("created_at")?,
                qa_turns: serde_json::from_str(&qa_json)?,
                generated_questions: serde_json::from_str(&generated_json)?,
            })
        })
        .transpose()
    }

    /// Append one question/answer exchange to the candidate's latest row,
    /// creating a row when none exists. Incoming generated questions are
    /// concatenated onto the stored list without dedup.
    ///
    /// The read-modify-write is not serialized per candidate; two
    /// concurrent appends can lose one update. Accepted weakness of the
    /// record model, see DESIGN.md.
    pub async fn append_turn(
        &self,
        candidate_id: &str,
        question: &str,
        answer: &str,
        generated_questions: &[String],
    ) -> Result<(), AppError> {
        if candidate_id.is_empty() || question.is_empty() || answer.is_empty() {
            return Err(AppError::Validation(
                "candidate_id, question, and answer are required".to_string(),
            ));
        }

        match self.find_latest(candidate_id).await? {
            Some(row) => {
                let mut qa_turns = row.qa_turns;
                qa_turns.push(QaTurn::Exchange {
                    question: Some(question.to_string()),
                    answer: Some(answer.to_string()),
                });
                let mut generated = row.generated_questions;
                generated.extend(generated_questions.iter().cloned());

                let sql = recordings::update_session_lists(
                    row.id,
                    &serde_json::to_string(&qa_turns)?,
                    &serde_json::to_string(&generated)?,
                );
                sqlx::query(&sql).execute(&self.pool).await?;
            }
            None => {
                let qa_turns = vec![QaTurn::Exchange {
                    question: Some(question.to_string()),
                    answer: Some(answer.to_string()),
                }];
                let sql = recordings::insert_session_row(
                    candidate_id,
                    Utc::now().timestamp_millis(),
                    &serde_json::to_string(&qa_turns)?,
                    &serde_json::to_string(generated_questions)?,
                );
                sqlx::query(&sql).execute(&self.pool).await?;
            }
        }

        Ok(())
    }

    /// Insert a fresh finalized row: the conversation turns with blank
    /// entries dropped (input order preserved), followed by exactly one
    /// trailing transcription entry. Never merges into an in-progress
    /// row, so a candidate's history may span several rows; preserved
    /// source behavior, see DESIGN.md.
    ///
    /// Returns the combined turn list as persisted.
    pub async fn finalize_with_recording(
        &self,
        candidate_id: &str,
        recording_url: &str,
        conversation: &[ConversationTurn],
        transcription: &str,
    ) -> Result<Vec<QaTurn>, AppError> {
        let mut qa_turns: Vec<QaTurn> = conversation
            .iter()
            .filter(|turn| !turn.is_blank())
            .map(|turn| QaTurn::Exchange {
                question: turn.question.clone(),
                answer: turn.answer.clone(),
            })
            .collect();
        qa_turns.push(QaTurn::Transcription {
            transcription: transcription.to_string(),
        });

        let sql = recordings::insert_finalized_row(
            candidate_id,
            recording_url,
            Utc::now().timestamp_millis(),
            &serde_json::to_string(&qa_turns)?,
        );
        sqlx::query(&sql).execute(&self.pool).await?;

        Ok(qa_turns)
    }

    /// Insert a bare row for a telephony recording callback: only the
    /// caller id, the recording location, and the timestamp.
    pub async fn record_inbound_call(
        &self,
        candidate_id: &str,
        recording_url: &str,
    ) -> Result<(), AppError> {
        let sql = recordings::insert_inbound_row(
            candidate_id,
            recording_url,
            Utc::now().timestamp_millis(),
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }
}
