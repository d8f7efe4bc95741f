use std::time::Duration;

/// Tunables for suggestion delivery and nudge computation.
///
/// The defaults reproduce the thresholds the product shipped with; none of
/// them carry documented rationale, which is exactly why they live in
/// config instead of constants.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CoachingConfig {
    /// How long after a prospect turn finalizes before a fallback
    /// suggestion request fires.
    #[serde(with = "duration_ms")]
    pub fallback_delay: Duration,
    /// How many candidates a "more options" request asks for.
    pub alternatives_count: usize,
    pub nudges: NudgeConfig,
}

impl Default for CoachingConfig {
    fn default() -> Self {
        Self {
            fallback_delay: Duration::from_millis(750),
            alternatives_count: 3,
            nudges: NudgeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    /// Rep talk ratio above which a warn-level nudge appears.
    pub talk_ratio_warn: f64,
    /// Rep talk ratio above which the nudge escalates to alert.
    pub talk_ratio_alert: f64,
    /// The talk-ratio nudge stays quiet until more than this many turns
    /// have finalized.
    pub min_turns: usize,
    pub max_nudges: usize,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            talk_ratio_warn: 0.65,
            talk_ratio_alert: 0.75,
            min_turns: 2,
            max_nudges: 3,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_thresholds() {
        let config = CoachingConfig::default();
        assert_eq!(config.fallback_delay, Duration::from_millis(750));
        assert_eq!(config.nudges.talk_ratio_warn, 0.65);
        assert_eq!(config.nudges.talk_ratio_alert, 0.75);
        assert_eq!(config.nudges.max_nudges, 3);
    }

    #[test]
    fn fallback_delay_roundtrips_as_millis() {
        let config = CoachingConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""fallback_delay":750"#));
        let back: CoachingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
