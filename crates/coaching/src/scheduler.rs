use ringside_coach_interface::SuggestionCandidate;
use ringside_turns::Transition;

/// Side effects the scheduler asks its caller to perform. The scheduler
/// itself never touches a timer or a socket — the session actor interprets
/// these and feeds results back in as inputs, stamped with the generation
/// they answer so late arrivals can be validated instead of trusted.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Make this the visible suggestion.
    Show(SuggestionCandidate),
    /// Clear the visible suggestion (the prospect started talking again).
    Clear,
    /// Start the fallback timer for this generation.
    ArmFallback { generation: u64 },
    /// The timer elapsed unserved: request one fallback candidate.
    RequestFallback { generation: u64 },
}

/// Decides when a [`SuggestionCandidate`] becomes the visible suggestion.
///
/// Invariant: while the prospect is speaking the visible suggestion is
/// always unset; otherwise the visible suggestion, if any, was shown for
/// the current turn generation. Candidates arriving mid-turn are parked in
/// a single pending slot (last-write-wins — only the most recent candidate
/// stays relevant once the prospect stops) and flushed exactly once on
/// exit from the listening state.
pub struct SuggestionScheduler {
    visible: Option<SuggestionCandidate>,
    pending: Option<SuggestionCandidate>,
    listening_prospect: bool,
    current_generation: u64,
    has_prospect_spoken: bool,
    shown_this_generation: bool,
    fallback_in_flight: Option<u64>,
}

impl SuggestionScheduler {
    pub fn new() -> Self {
        Self {
            visible: None,
            pending: None,
            listening_prospect: false,
            current_generation: 0,
            has_prospect_spoken: false,
            shown_this_generation: false,
            fallback_in_flight: None,
        }
    }

    pub fn visible(&self) -> Option<&SuggestionCandidate> {
        self.visible.as_ref()
    }

    #[cfg(test)]
    fn pending(&self) -> Option<&SuggestionCandidate> {
        self.pending.as_ref()
    }

    /// Apply a turn-taking transition.
    pub fn on_transition(&mut self, transition: &Transition) -> Vec<Effect> {
        let mut effects = Vec::new();

        if let Some(generation) = transition.prospect_finalized {
            self.current_generation = generation;
            self.has_prospect_spoken = true;
            self.shown_this_generation = false;
            effects.push(Effect::ArmFallback { generation });
        }

        if transition.entered_prospect {
            self.listening_prospect = true;
            if self.visible.take().is_some() {
                effects.push(Effect::Clear);
            }
        }

        if transition.left_prospect {
            self.listening_prospect = false;
            if let Some(parked) = self.pending.take() {
                effects.push(self.display(parked));
            }
        }

        effects
    }

    /// A candidate arrived from the coaching computation (or from a
    /// resolved fallback — both go through the same gate).
    pub fn on_candidate(&mut self, candidate: SuggestionCandidate) -> Vec<Effect> {
        if self.listening_prospect {
            self.pending = Some(candidate);
            return vec![];
        }

        if self.is_discardable(&candidate) {
            return vec![];
        }

        vec![self.display(candidate)]
    }

    /// The fallback timer for `generation` elapsed. Fires at most one
    /// request: a timer for a superseded generation, an already-served
    /// turn, a prospect mid-turn, or an in-flight request all suppress it.
    pub fn on_fallback_elapsed(&mut self, generation: u64) -> Vec<Effect> {
        if generation != self.current_generation
            || self.shown_this_generation
            || self.listening_prospect
            || self.fallback_in_flight.is_some()
        {
            return vec![];
        }

        self.fallback_in_flight = Some(generation);
        vec![Effect::RequestFallback { generation }]
    }

    /// The fallback network call resolved. `candidate` is `None` on
    /// failure, which leaves the visible state untouched.
    pub fn on_fallback_resolved(
        &mut self,
        generation: u64,
        candidate: Option<SuggestionCandidate>,
    ) -> Vec<Effect> {
        if self.fallback_in_flight == Some(generation) {
            self.fallback_in_flight = None;
        }

        match candidate {
            Some(candidate) => self.on_candidate(candidate),
            None => vec![],
        }
    }

    /// The rep picked one of the "more options" alternatives. Bypasses the
    /// once-per-generation gate — an explicit request may replace an
    /// already-shown suggestion — but still respects the mid-turn guard.
    pub fn on_alternative_selected(&mut self, text: String) -> Vec<Effect> {
        let candidate = SuggestionCandidate {
            text,
            turn_generation: self.current_generation,
        };

        if self.listening_prospect {
            self.pending = Some(candidate);
            return vec![];
        }

        vec![self.display(candidate)]
    }

    fn display(&mut self, candidate: SuggestionCandidate) -> Effect {
        self.shown_this_generation = true;
        self.visible = Some(candidate.clone());
        Effect::Show(candidate)
    }

    /// A candidate is dropped only when the current turn has already been
    /// served and the candidate adds nothing: a replay of the current
    /// generation, or a leftover from an older turn. Before the first
    /// prospect turn there is nothing to be stale against — opening lines
    /// always display.
    fn is_discardable(&self, candidate: &SuggestionCandidate) -> bool {
        if !self.shown_this_generation {
            return false;
        }
        let replay = candidate.turn_generation == self.current_generation;
        let stale = candidate.turn_generation < self.current_generation && self.has_prospect_spoken;
        replay || stale
    }
}

impl Default for SuggestionScheduler {
    fn default() -> Self {
        Self::new()
    }
}
