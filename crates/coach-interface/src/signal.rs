use crate::call::Speaker;

/// One asynchronous message from the coaching computation.
///
/// The service emits these independently of transcript finality: a
/// `Speaking` signal may arrive before the recognizer has finalized the
/// corresponding utterance, and suggestions arrive whenever the computation
/// finishes, not when the UI is ready for them.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum CoachSignal {
    Suggestion(SuggestionCandidate),
    Advisory {
        tags: Vec<String>,
    },
    Speaking {
        speaker: Speaker,
        timestamp_ms: i64,
    },
    Error {
        message: String,
    },
}

/// A computed "next thing to say" recommendation.
///
/// `turn_generation` stamps which prospect turn the computation was answering;
/// the scheduler uses it to reject candidates that arrive after a newer turn
/// has superseded them.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct SuggestionCandidate {
    pub text: String,
    pub turn_generation: u64,
}

/// Advisory tags the coaching computation may attach to a call.
///
/// Tags arrive as strings on the wire; anything that does not parse into
/// this enum is dropped silently so new server-side tags never break old
/// clients.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::AsRefStr, strum::Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvisoryTag {
    TooMuchTalking,
    SpeakingTooFast,
    Monologue,
    CompetitorMentioned,
    PricingDiscussed,
    NextStepsMissing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisory_tags_parse_from_wire_strings() {
        assert_eq!(
            "TOO_MUCH_TALKING".parse::<AdvisoryTag>().unwrap(),
            AdvisoryTag::TooMuchTalking
        );
        assert_eq!(
            "PRICING_DISCUSSED".parse::<AdvisoryTag>().unwrap(),
            AdvisoryTag::PricingDiscussed
        );
    }

    #[test]
    fn unknown_tags_fail_to_parse() {
        assert!("SOME_FUTURE_TAG".parse::<AdvisoryTag>().is_err());
    }

    #[test]
    fn coach_signal_wire_format() {
        let json = r#"{"type":"suggestion","text":"Ask about their timeline.","turn_generation":3}"#;
        let parsed: CoachSignal = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed,
            CoachSignal::Suggestion(SuggestionCandidate {
                text: "Ask about their timeline.".into(),
                turn_generation: 3,
            })
        );

        let json = r#"{"type":"speaking","speaker":"prospect","timestamp_ms":1200}"#;
        let parsed: CoachSignal = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed,
            CoachSignal::Speaking {
                speaker: Speaker::Prospect,
                timestamp_ms: 1200,
            }
        );
    }
}
