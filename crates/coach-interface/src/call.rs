#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Rep,
    Prospect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum CallMode {
    Live,
    Practice,
}

/// Coarse phase of a call. Transitions only move forward; `Ended` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum CallPhase {
    Initiated,
    InProgress,
    Ended,
    Failed,
}

impl CallPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallPhase::Ended | CallPhase::Failed)
    }

    /// Forward-only transition check. Cancellation from `Initiated` goes
    /// straight to `Ended` without passing through `InProgress`.
    pub fn can_transition_to(&self, next: CallPhase) -> bool {
        match (self, next) {
            (CallPhase::Initiated, CallPhase::InProgress) => true,
            (CallPhase::Initiated, CallPhase::Ended) => true,
            (CallPhase::Initiated, CallPhase::Failed) => true,
            (CallPhase::InProgress, CallPhase::Ended) => true,
            (CallPhase::InProgress, CallPhase::Failed) => true,
            _ => false,
        }
    }
}

/// One speech-recognition message from the upstream recognizer.
///
/// Delivery is at-least-once and ordered per speaker; that ordering is an
/// external contract, not something the merger re-establishes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct RecognizerEvent {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp_ms: i64,
    pub is_final: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_phases_accept_no_transition() {
        for next in [
            CallPhase::Initiated,
            CallPhase::InProgress,
            CallPhase::Ended,
            CallPhase::Failed,
        ] {
            assert!(!CallPhase::Ended.can_transition_to(next));
            assert!(!CallPhase::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn cancellation_skips_in_progress() {
        assert!(CallPhase::Initiated.can_transition_to(CallPhase::Ended));
    }

    #[test]
    fn no_phase_regression() {
        assert!(!CallPhase::InProgress.can_transition_to(CallPhase::Initiated));
    }
}
