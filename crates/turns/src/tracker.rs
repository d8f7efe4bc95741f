use ringside_coach_interface::Speaker;

use crate::log::MergeOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    ListeningProspect,
    ListeningRep,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// How long an explicit speaking signal outranks transcript-derived
    /// transitions, compared on event timestamps.
    pub explicit_precedence_ms: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            explicit_precedence_ms: 1200,
        }
    }
}

/// What one observation changed, precomputed so the scheduler does not
/// diff states itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: TurnState,
    pub entered_prospect: bool,
    pub left_prospect: bool,
    /// Set when a prospect turn finalized; carries the new generation.
    pub prospect_finalized: Option<u64>,
}

/// Derives "who is speaking now" from the merged stream, with explicit
/// speaking signals from the coaching service taking precedence.
///
/// The coaching service sees speech before the recognizer finalizes it, so
/// its explicit signals flip state immediately and suppress
/// transcript-derived transitions for a short window. When no explicit
/// signal is recent, partial activity enters `Listening*` and finalization
/// drops back to `Idle`.
///
/// The tracker also owns the two counters the merger's side effects feed:
/// `turn_generation` (incremented each time a prospect turn finalizes) and
/// the sticky `has_prospect_spoken` flag.
pub struct TurnTracker {
    state: TurnState,
    turn_generation: u64,
    has_prospect_spoken: bool,
    last_explicit_ms: Option<i64>,
    config: TrackerConfig,
}

impl TurnTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            state: TurnState::Idle,
            turn_generation: 0,
            has_prospect_spoken: false,
            last_explicit_ms: None,
            config,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn turn_generation(&self) -> u64 {
        self.turn_generation
    }

    pub fn has_prospect_spoken(&self) -> bool {
        self.has_prospect_spoken
    }

    /// Explicit speaking signal from the coaching service. Always wins.
    pub fn observe_speaking(&mut self, speaker: Speaker, timestamp_ms: i64) -> Transition {
        self.last_explicit_ms = Some(timestamp_ms);
        let next = match speaker {
            Speaker::Prospect => TurnState::ListeningProspect,
            Speaker::Rep => TurnState::ListeningRep,
        };
        self.transition_to(next, None)
    }

    /// Transcript-derived signal. Counter side effects always apply; the
    /// state change is suppressed while an explicit signal is fresh.
    pub fn observe_merge(&mut self, outcome: MergeOutcome, timestamp_ms: i64) -> Transition {
        let prospect_finalized = match outcome {
            MergeOutcome::Finalized {
                speaker: Speaker::Prospect,
                ..
            } => {
                self.turn_generation += 1;
                self.has_prospect_spoken = true;
                Some(self.turn_generation)
            }
            _ => None,
        };

        if !self.explicit_is_fresh(timestamp_ms) {
            let next = match outcome {
                MergeOutcome::PartialStarted { speaker }
                | MergeOutcome::PartialUpdated { speaker } => match speaker {
                    Speaker::Prospect => TurnState::ListeningProspect,
                    Speaker::Rep => TurnState::ListeningRep,
                },
                MergeOutcome::Finalized { .. } => TurnState::Idle,
            };
            self.transition_to(next, prospect_finalized)
        } else {
            Transition {
                state: self.state,
                entered_prospect: false,
                left_prospect: false,
                prospect_finalized,
            }
        }
    }

    fn explicit_is_fresh(&self, timestamp_ms: i64) -> bool {
        self.last_explicit_ms
            .is_some_and(|t| timestamp_ms.saturating_sub(t) <= self.config.explicit_precedence_ms)
    }

    fn transition_to(&mut self, next: TurnState, prospect_finalized: Option<u64>) -> Transition {
        let was_prospect = self.state == TurnState::ListeningProspect;
        let is_prospect = next == TurnState::ListeningProspect;
        self.state = next;
        Transition {
            state: next,
            entered_prospect: is_prospect && !was_prospect,
            left_prospect: was_prospect && !is_prospect,
            prospect_finalized,
        }
    }
}

impl Default for TurnTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finalized(speaker: Speaker) -> MergeOutcome {
        MergeOutcome::Finalized {
            speaker,
            sequence: 0,
        }
    }

    #[test]
    fn partial_activity_enters_listening_state() {
        let mut tracker = TurnTracker::default();

        let t = tracker.observe_merge(
            MergeOutcome::PartialStarted {
                speaker: Speaker::Prospect,
            },
            100,
        );

        assert_eq!(t.state, TurnState::ListeningProspect);
        assert!(t.entered_prospect);
    }

    #[test]
    fn finalization_drops_back_to_idle() {
        let mut tracker = TurnTracker::default();

        tracker.observe_merge(
            MergeOutcome::PartialStarted {
                speaker: Speaker::Prospect,
            },
            100,
        );
        let t = tracker.observe_merge(finalized(Speaker::Prospect), 900);

        assert_eq!(t.state, TurnState::Idle);
        assert!(t.left_prospect);
        assert_eq!(t.prospect_finalized, Some(1));
    }

    #[test]
    fn prospect_final_increments_generation_and_sets_sticky_flag() {
        let mut tracker = TurnTracker::default();
        assert_eq!(tracker.turn_generation(), 0);
        assert!(!tracker.has_prospect_spoken());

        tracker.observe_merge(finalized(Speaker::Prospect), 100);
        assert_eq!(tracker.turn_generation(), 1);
        assert!(tracker.has_prospect_spoken());

        tracker.observe_merge(finalized(Speaker::Prospect), 2000);
        assert_eq!(tracker.turn_generation(), 2);
    }

    #[test]
    fn rep_final_does_not_touch_generation() {
        let mut tracker = TurnTracker::default();
        tracker.observe_merge(finalized(Speaker::Rep), 100);
        assert_eq!(tracker.turn_generation(), 0);
        assert!(!tracker.has_prospect_spoken());
    }

    #[test]
    fn explicit_signal_flips_state_immediately() {
        let mut tracker = TurnTracker::default();

        let t = tracker.observe_speaking(Speaker::Prospect, 100);
        assert_eq!(t.state, TurnState::ListeningProspect);
        assert!(t.entered_prospect);

        let t = tracker.observe_speaking(Speaker::Rep, 200);
        assert_eq!(t.state, TurnState::ListeningRep);
        assert!(t.left_prospect);
    }

    #[test]
    fn fresh_explicit_signal_suppresses_transcript_transition() {
        let mut tracker = TurnTracker::default();

        tracker.observe_speaking(Speaker::Prospect, 1000);

        // recognizer lags behind; its partial for the rep arrives inside
        // the precedence window and must not flip state
        let t = tracker.observe_merge(
            MergeOutcome::PartialStarted {
                speaker: Speaker::Rep,
            },
            1500,
        );
        assert_eq!(t.state, TurnState::ListeningProspect);
        assert!(!t.left_prospect);
    }

    #[test]
    fn stale_explicit_signal_yields_to_transcript() {
        let mut tracker = TurnTracker::default();

        tracker.observe_speaking(Speaker::Prospect, 1000);

        let t = tracker.observe_merge(
            MergeOutcome::PartialStarted {
                speaker: Speaker::Rep,
            },
            3000,
        );
        assert_eq!(t.state, TurnState::ListeningRep);
        assert!(t.left_prospect);
    }

    #[test]
    fn suppressed_transition_still_applies_generation_side_effect() {
        let mut tracker = TurnTracker::default();

        tracker.observe_speaking(Speaker::Prospect, 1000);
        let t = tracker.observe_merge(finalized(Speaker::Prospect), 1400);

        // state held by the explicit signal, but the turn still closed
        assert_eq!(t.state, TurnState::ListeningProspect);
        assert_eq!(t.prospect_finalized, Some(1));
        assert_eq!(tracker.turn_generation(), 1);
    }

    #[test]
    fn reentering_prospect_reports_entered_flag_once() {
        let mut tracker = TurnTracker::default();

        let first = tracker.observe_speaking(Speaker::Prospect, 100);
        assert!(first.entered_prospect);

        let again = tracker.observe_speaking(Speaker::Prospect, 200);
        assert!(!again.entered_prospect);
        assert!(!again.left_prospect);
    }
}
