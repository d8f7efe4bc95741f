pub mod call;
pub mod signal;
pub mod synthesis;

pub use call::{CallMode, CallPhase, RecognizerEvent, Speaker};
pub use signal::{AdvisoryTag, CoachSignal, SuggestionCandidate};
pub use synthesis::SynthesisResponse;

/// Outbound message on a duplex audio channel: either a payload frame or a
/// control frame. Mirrors what the synthesis collaborator accepts — binary
/// frames carry audio, text frames carry serialized control messages.
#[derive(Debug, Clone)]
pub enum MixedMessage<A, C> {
    Audio(A),
    Control(C),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    KeepAlive,
    CloseStream,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_message_wire_format_is_tagged() {
        let json = serde_json::to_string(&ControlMessage::KeepAlive).unwrap();
        assert_eq!(json, r#"{"type":"keep_alive"}"#);

        let parsed: ControlMessage = serde_json::from_str(r#"{"type":"close_stream"}"#).unwrap();
        assert_eq!(parsed, ControlMessage::CloseStream);
    }
}
