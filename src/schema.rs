use sea_query::Iden;

/// Recordings table - one row per candidate-session phase
#[derive(Iden)]
pub enum Recordings {
    Table,
    Id,
    CandidateId,
    RecordingUrl,
    CreatedAt,
    QaData,
    GeneratedQuestions,
}

/// Interview data table - flat per-question records. Created at startup
/// but nothing writes to it; the recordings table holds the live data.
#[derive(Iden)]
pub enum InterviewData {
    Table,
    Id,
    CandidateId,
    Question,
    Answer,
    CreatedAt,
}
