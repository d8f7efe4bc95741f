use ringside_coach_interface::CallMode;
use ringside_coaching::CoachingConfig;
use ringside_turns::TrackerConfig;

/// Everything needed to start one coached call.
///
/// An empty `*_base_url` disables that collaborator: no call-control
/// notifications, no fallback/alternatives requests, no synthesis bridge.
/// Tests and the CLI run with collaborators switched off selectively.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionParams {
    pub session_id: String,
    pub mode: CallMode,
    #[serde(default)]
    pub coach_base_url: String,
    #[serde(default)]
    pub coach_api_key: String,
    #[serde(default)]
    pub call_control_base_url: String,
    #[serde(default)]
    pub synthesis_base_url: String,
    #[serde(default)]
    pub synthesis_api_key: String,
    /// Record practice-session uplink audio to this WAV path.
    #[serde(default)]
    pub record_path: Option<std::path::PathBuf>,
    #[serde(default)]
    pub options: SessionOptions,
    #[serde(default)]
    pub coaching: CoachingConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

/// The behavioral deltas that used to be separate page implementations,
/// now plain configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Include scheduler internals in every snapshot.
    pub debug_overlay: bool,
}
