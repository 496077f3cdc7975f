use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use crate::schema::Recordings;

/// SELECT id, candidate_id, recording_url, created_at, qa_data, generated_questions
/// FROM recordings WHERE candidate_id = ?
/// ORDER BY created_at DESC, id DESC LIMIT 1
///
/// The id tiebreak keeps the append target deterministic when two rows
/// share a creation timestamp.
pub fn select_latest_for_candidate(candidate_id: &str) -> String {
    Query::select()
        .columns([
            Recordings::Id,
            Recordings::CandidateId,
            Recordings::RecordingUrl,
            Recordings::CreatedAt,
            Recordings::QaData,
            Recordings::GeneratedQuestions,
        ])
        .from(Recordings::Table)
        .and_where(Expr::col(Recordings::CandidateId).eq(candidate_id))
        .order_by(Recordings::CreatedAt, Order::Desc)
        .order_by(Recordings::Id, Order::Desc)
        .limit(1)
        .to_string(SqliteQueryBuilder)
}

/// INSERT INTO recordings (candidate_id, created_at, qa_data, generated_questions)
/// VALUES (?, ?, ?, ?)
pub fn insert_session_row(
    candidate_id: &str,
    created_at_ms: i64,
    qa_json: &str,
    generated_json: &str,
) -> String {
    Query::insert()
        .into_table(Recordings::Table)
        .columns([
            Recordings::CandidateId,
            Recordings::CreatedAt,
            Recordings::QaData,
            Recordings::GeneratedQuestions,
        ])
        .values_panic([
            candidate_id.into(),
            created_at_ms.into(),
            qa_json.into(),
            generated_json.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// UPDATE recordings SET qa_data = ?, generated_questions = ? WHERE id = ?
pub fn update_session_lists(id: i64, qa_json: &str, generated_json: &str) -> String {
    Query::update()
        .table(Recordings::Table)
        .value(Recordings::QaData, qa_json)
        .value(Recordings::GeneratedQuestions, generated_json)
        .and_where(Expr::col(Recordings::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// INSERT INTO recordings (candidate_id, recording_url, created_at, qa_data)
/// VALUES (?, ?, ?, ?)
/// Used by finalization, which always creates a fresh row.
pub fn insert_finalized_row(
    candidate_id: &str,
    recording_url: &str,
    created_at_ms: i64,
    qa_json: &str,
) -> String {
    Query::insert()
        .into_table(Recordings::Table)
        .columns([
            Recordings::CandidateId,
            Recordings::RecordingUrl,
            Recordings::CreatedAt,
            Recordings::QaData,
        ])
        .values_panic([
            candidate_id.into(),
            recording_url.into(),
            created_at_ms.into(),
            qa_json.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// INSERT INTO recordings (candidate_id, recording_url, created_at)
/// VALUES (?, ?, ?)
/// Bare row for inbound telephony recording callbacks.
pub fn insert_inbound_row(candidate_id: &str, recording_url: &str, created_at_ms: i64) -> String {
    Query::insert()
        .into_table(Recordings::Table)
        .columns([
            Recordings::CandidateId,
            Recordings::RecordingUrl,
            Recordings::CreatedAt,
        ])
        .values_panic([
            candidate_id.into(),
            recording_url.into(),
            created_at_ms.into(),
        ])
        .to_string(SqliteQueryBuilder)
}
