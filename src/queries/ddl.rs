use sea_query::{ColumnDef, Index, SqliteQueryBuilder, Table};

use crate::schema::{InterviewData, Recordings};

/// CREATE TABLE IF NOT EXISTS recordings (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     candidate_id TEXT NOT NULL,
///     recording_url TEXT,
///     created_at INTEGER NOT NULL,
///     qa_data TEXT NOT NULL DEFAULT '[]',
///     generated_questions TEXT NOT NULL DEFAULT '[]'
/// )
///
/// created_at is UTC milliseconds; qa_data and generated_questions hold
/// JSON arrays.
pub fn create_recordings_table() -> String {
    Table::create()
        .table(Recordings::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Recordings::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(Recordings::CandidateId).string().not_null())
        .col(ColumnDef::new(Recordings::RecordingUrl).string())
        .col(
            ColumnDef::new(Recordings::CreatedAt)
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(Recordings::QaData)
                .string()
                .not_null()
                .default("[]"),
        )
        .col(
            ColumnDef::new(Recordings::GeneratedQuestions)
                .string()
                .not_null()
                .default("[]"),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS interview_data (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     candidate_id TEXT NOT NULL,
///     question TEXT,
///     answer TEXT,
///     created_at INTEGER NOT NULL
/// )
pub fn create_interview_data_table() -> String {
    Table::create()
        .table(InterviewData::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(InterviewData::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(
            ColumnDef::new(InterviewData::CandidateId)
                .string()
                .not_null(),
        )
        .col(ColumnDef::new(InterviewData::Question).string())
        .col(ColumnDef::new(InterviewData::Answer).string())
        .col(
            ColumnDef::new(InterviewData::CreatedAt)
                .big_integer()
                .not_null(),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_recordings_candidate_created
/// ON recordings(candidate_id, created_at)
pub fn create_recordings_candidate_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_recordings_candidate_created")
        .table(Recordings::Table)
        .col(Recordings::CandidateId)
        .col(Recordings::CreatedAt)
        .to_string(SqliteQueryBuilder)
}
