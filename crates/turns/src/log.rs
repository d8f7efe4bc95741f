use ringside_coach_interface::{RecognizerEvent, Speaker};

use crate::id::{TurnIdGen, UuidTurnIds};
use crate::types::TurnEntry;

/// What one recognizer event did to the log. The tracker consumes these to
/// derive turn-taking state without re-reading the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A new in-progress turn was appended.
    PartialStarted { speaker: Speaker },
    /// The trailing in-progress turn was replaced in place.
    PartialUpdated { speaker: Speaker },
    /// A turn closed and took the given sequence number.
    Finalized { speaker: Speaker, sequence: u64 },
}

impl MergeOutcome {
    pub fn speaker(&self) -> Speaker {
        match self {
            MergeOutcome::PartialStarted { speaker }
            | MergeOutcome::PartialUpdated { speaker }
            | MergeOutcome::Finalized { speaker, .. } => *speaker,
        }
    }
}

/// Append-only ordered turn log with in-place partial replacement.
///
/// The merge rule only ever inspects the trailing entry: a partial for
/// speaker S replaces the trailing entry if that entry is a non-final S
/// turn, otherwise it appends. A final closes the trailing non-final S
/// entry if present, otherwise it appends a new, already-final entry.
/// Out-of-order arrivals are accepted as-is — per-speaker ordering is the
/// upstream recognizer's documented contract, not something re-established
/// here.
pub struct TurnLog {
    entries: Vec<TurnEntry>,
    next_sequence: u64,
    last_final: std::collections::HashMap<Speaker, (String, i64)>,
    ids: Box<dyn TurnIdGen>,
}

impl TurnLog {
    pub fn new() -> Self {
        Self::with_ids(UuidTurnIds)
    }

    pub fn with_ids(ids: impl TurnIdGen + 'static) -> Self {
        Self {
            entries: Vec::new(),
            next_sequence: 0,
            last_final: std::collections::HashMap::new(),
            ids: Box::new(ids),
        }
    }

    pub fn entries(&self) -> &[TurnEntry] {
        &self.entries
    }

    /// Feed one recognizer event. Returns `None` for events that change
    /// nothing: blank text, or an at-least-once redelivery of the most
    /// recently finalized turn.
    pub fn apply(&mut self, event: &RecognizerEvent) -> Option<MergeOutcome> {
        if event.text.trim().is_empty() {
            return None;
        }

        if event.is_final {
            self.apply_final(event)
        } else {
            self.apply_partial(event)
        }
    }

    fn apply_partial(&mut self, event: &RecognizerEvent) -> Option<MergeOutcome> {
        if let Some(last) = self.entries.last_mut()
            && !last.is_final
            && last.speaker == event.speaker
        {
            last.text = event.text.clone();
            return Some(MergeOutcome::PartialUpdated {
                speaker: event.speaker,
            });
        }

        self.entries.push(TurnEntry {
            id: self.ids.next(),
            speaker: event.speaker,
            text: event.text.clone(),
            timestamp_ms: event.timestamp_ms,
            is_final: false,
            sequence: None,
        });
        Some(MergeOutcome::PartialStarted {
            speaker: event.speaker,
        })
    }

    fn apply_final(&mut self, event: &RecognizerEvent) -> Option<MergeOutcome> {
        if self.is_redelivery(event) {
            return None;
        }

        let sequence = self.next_sequence;

        if let Some(last) = self.entries.last_mut()
            && !last.is_final
            && last.speaker == event.speaker
        {
            last.text = event.text.clone();
            last.is_final = true;
            last.sequence = Some(sequence);
        } else {
            self.entries.push(TurnEntry {
                id: self.ids.next(),
                speaker: event.speaker,
                text: event.text.clone(),
                timestamp_ms: event.timestamp_ms,
                is_final: true,
                sequence: Some(sequence),
            });
        }

        self.next_sequence += 1;
        self.last_final.insert(
            event.speaker,
            (event.text.clone(), event.timestamp_ms),
        );
        Some(MergeOutcome::Finalized {
            speaker: event.speaker,
            sequence,
        })
    }

    /// At-least-once delivery means the same final can arrive twice. A
    /// repeat of the most recently finalized event for that speaker is
    /// dropped so it cannot bump the sequence or the turn generation.
    /// Compared against the event as delivered, not the logged entry — a
    /// final that closed a partial keeps the partial's first-heard time.
    fn is_redelivery(&self, event: &RecognizerEvent) -> bool {
        self.last_final
            .get(&event.speaker)
            .is_some_and(|(text, at)| *text == event.text && *at == event.timestamp_ms)
    }
}

impl Default for TurnLog {
    fn default() -> Self {
        Self::new()
    }
}
