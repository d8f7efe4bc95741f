use ringside_coach_interface::AdvisoryTag;
use ringside_turns::CallStats;

use crate::config::NudgeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum NudgeCategory {
    Talk,
    Pace,
    Monologue,
    Competitor,
    Pricing,
    NextSteps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Alert,
}

/// A short advisory surfaced next to the suggestion panel. Identity for
/// de-duplication is the category — at most one nudge per category is
/// shown.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct Nudge {
    pub category: NudgeCategory,
    pub label: String,
    pub severity: Severity,
}

fn nudge_for_tag(tag: AdvisoryTag) -> Nudge {
    let (category, label, severity) = match tag {
        AdvisoryTag::TooMuchTalking => (NudgeCategory::Talk, "Talking too much", Severity::Warn),
        AdvisoryTag::SpeakingTooFast => (NudgeCategory::Pace, "Slow down", Severity::Warn),
        AdvisoryTag::Monologue => (NudgeCategory::Monologue, "Let them speak", Severity::Warn),
        AdvisoryTag::CompetitorMentioned => {
            (NudgeCategory::Competitor, "Competitor mentioned", Severity::Info)
        }
        AdvisoryTag::PricingDiscussed => {
            (NudgeCategory::Pricing, "Pricing discussed", Severity::Info)
        }
        AdvisoryTag::NextStepsMissing => {
            (NudgeCategory::NextSteps, "Lock in next steps", Severity::Warn)
        }
    };
    Nudge {
        category,
        label: label.to_string(),
        severity,
    }
}

/// Fold the local talk-ratio signal and the service's advisory tags into
/// the displayed nudge list.
///
/// The talk-ratio nudge is computed first so it wins the category tie
/// against a service-sent talk tag. Unrecognized tag strings are dropped —
/// the server may ship new tags before clients learn them. Output is
/// deduplicated by category (first occurrence wins) and capped.
pub fn aggregate(stats: &CallStats, tags: &[String], config: &NudgeConfig) -> Vec<Nudge> {
    let mut nudges = Vec::new();

    if let Some(talk) = talk_ratio_nudge(stats, config) {
        nudges.push(talk);
    }

    nudges.extend(
        tags.iter()
            .filter_map(|raw| raw.parse::<AdvisoryTag>().ok())
            .map(nudge_for_tag),
    );

    let mut seen = std::collections::HashSet::new();
    nudges.retain(|n| seen.insert(n.category));
    nudges.truncate(config.max_nudges);
    nudges
}

fn talk_ratio_nudge(stats: &CallStats, config: &NudgeConfig) -> Option<Nudge> {
    if stats.total_turns() <= config.min_turns {
        return None;
    }

    let ratio = stats.rep_talk_ratio();
    if ratio <= config.talk_ratio_warn {
        return None;
    }

    let severity = if ratio > config.talk_ratio_alert {
        Severity::Alert
    } else {
        Severity::Warn
    };

    Some(Nudge {
        category: NudgeCategory::Talk,
        label: "Talking too much".to_string(),
        severity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(rep_words: usize, prospect_words: usize, turns: usize) -> CallStats {
        CallStats {
            rep_turns: turns.div_ceil(2),
            prospect_turns: turns / 2,
            rep_words,
            prospect_words,
        }
    }

    fn config() -> NudgeConfig {
        NudgeConfig::default()
    }

    #[test]
    fn quiet_call_produces_no_nudges() {
        let out = aggregate(&stats(10, 10, 4), &[], &config());
        assert!(out.is_empty());
    }

    #[test]
    fn high_ratio_emits_warn_then_alert() {
        // ~70% rep share
        let warn = aggregate(&stats(28, 12, 4), &[], &config());
        assert_eq!(warn.len(), 1);
        assert_eq!(warn[0].category, NudgeCategory::Talk);
        assert_eq!(warn[0].severity, Severity::Warn);

        // ~80% rep share
        let alert = aggregate(&stats(40, 10, 4), &[], &config());
        assert_eq!(alert[0].severity, Severity::Alert);
    }

    #[test]
    fn ratio_nudge_waits_for_enough_turns() {
        let out = aggregate(&stats(40, 10, 2), &[], &config());
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_tags_are_dropped_silently() {
        let tags = vec!["NOT_A_REAL_TAG".to_string(), "PRICING_DISCUSSED".to_string()];
        let out = aggregate(&CallStats::default(), &tags, &config());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, NudgeCategory::Pricing);
    }

    #[test]
    fn talk_ratio_beats_service_talk_tag() {
        let tags = vec!["TOO_MUCH_TALKING".to_string()];
        let out = aggregate(&stats(40, 10, 4), &tags, &config());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, NudgeCategory::Talk);
        assert_eq!(out[0].severity, Severity::Alert);
    }

    #[test]
    fn output_is_deduped_and_capped() {
        let tags: Vec<String> = [
            "TOO_MUCH_TALKING",
            "SPEAKING_TOO_FAST",
            "SPEAKING_TOO_FAST",
            "MONOLOGUE",
            "COMPETITOR_MENTIONED",
            "PRICING_DISCUSSED",
            "NEXT_STEPS_MISSING",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let out = aggregate(&stats(40, 10, 4), &tags, &config());

        assert!(out.len() <= 3);
        let categories: std::collections::HashSet<_> = out.iter().map(|n| n.category).collect();
        assert_eq!(categories.len(), out.len());
        // reserved slot: the talk nudge is first
        assert_eq!(out[0].category, NudgeCategory::Talk);
    }

    #[test]
    fn tag_order_is_preserved_after_the_reserved_slot() {
        let tags: Vec<String> = ["PRICING_DISCUSSED", "SPEAKING_TOO_FAST"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = aggregate(&CallStats::default(), &tags, &config());
        assert_eq!(out[0].category, NudgeCategory::Pricing);
        assert_eq!(out[1].category, NudgeCategory::Pace);
    }
}
