use rand::RngCore;

/// Model used for realtime voice sessions
pub const REALTIME_MODEL: &str = "gpt-4o-realtime-preview";

/// Voice preset for realtime sessions
pub const REALTIME_VOICE: &str = "alloy";

/// Model used to generate follow-up interview questions
pub const COMPLETION_MODEL: &str = "gpt-4o-mini";

/// Model used to transcribe completed recordings
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Generate a fresh candidate identifier: 16 lowercase hex characters
/// from the OS random source. One id per interview attempt, never reused.
pub fn generate_candidate_id() -> String {
    let mut bytes = [0u8; 8];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_id_is_fixed_length_hex() {
        let id = generate_candidate_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn candidate_ids_are_one_shot() {
        assert_ne!(generate_candidate_id(), generate_candidate_id());
    }
}
