use ringside_coach_interface::Speaker;

/// One row of the displayed transcript.
///
/// `timestamp_ms` is the time the turn was first heard — replacing a partial
/// hypothesis in place does not move it. `sequence` is assigned only when
/// the turn finalizes and is the sole ordering key downstream consumers may
/// rely on.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct TurnEntry {
    pub id: String,
    pub speaker: Speaker,
    pub text: String,
    pub timestamp_ms: i64,
    pub is_final: bool,
    pub sequence: Option<u64>,
}

impl TurnEntry {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
