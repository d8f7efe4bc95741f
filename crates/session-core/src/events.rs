use ringside_coach_interface::{CallPhase, SuggestionCandidate};
use ringside_coaching::Nudge;
use ringside_turns::{TurnEntry, TurnState};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionLifecycleEvent {
    #[serde(rename = "sessionRinging")]
    Ringing { session_id: String },
    #[serde(rename = "sessionActive")]
    Active { session_id: String },
    #[serde(rename = "sessionEnded")]
    Ended { session_id: String },
    #[serde(rename = "sessionFailed")]
    Failed { session_id: String, error: String },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionProgressEvent {
    #[serde(rename = "coachConnecting")]
    Connecting { session_id: String },
    #[serde(rename = "coachConnected")]
    Connected { session_id: String },
    #[serde(rename = "audioReady")]
    AudioReady {
        session_id: String,
        device: Option<String>,
    },
    /// Practice audio is unavailable; the session continues transcript-only.
    #[serde(rename = "audioDegraded")]
    AudioDegraded { session_id: String, error: String },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionErrorEvent {
    #[serde(rename = "coachingError")]
    Coaching { session_id: String, error: String },
    #[serde(rename = "synthesisError")]
    Synthesis { session_id: String, error: String },
    /// End-of-call notification could not be delivered; the local
    /// lifecycle has already moved on.
    #[serde(rename = "callControlWarning")]
    CallControlWarning { session_id: String, error: String },
}

/// The complete, always-consistent presentation state.
///
/// Rebuilt and emitted synchronously after every processed event, so the
/// UI never observes a half-applied update: either the previous snapshot
/// or the next one, nothing in between.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct CoachSnapshot {
    pub session_id: String,
    pub phase: CallPhase,
    pub speaking: TurnState,
    /// Unset whenever the prospect is speaking — the UI shows the
    /// listening indicator instead.
    pub suggestion: Option<SuggestionCandidate>,
    /// Transient "more options" list; cleared when one is selected.
    pub alternatives: Vec<SuggestionCandidate>,
    pub nudges: Vec<Nudge>,
    pub transcript: Vec<TurnEntry>,
    pub bridge_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugState>,
}

/// Scheduler internals for the debug overlay.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct DebugState {
    pub turn_generation: u64,
    pub has_prospect_spoken: bool,
}
