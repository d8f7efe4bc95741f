use bytes::Bytes;

/// One inbound frame from the voice-synthesis collaborator.
///
/// Binary frames carry synthesized 16-bit PCM in strict arrival order; text
/// frames carry the control events below. Arrival order is the playback
/// order — there is no sequence number on the wire.
#[derive(Debug, Clone)]
pub enum SynthesisResponse {
    Audio(Bytes),
    Event(SynthesisEvent),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SynthesisEvent {
    Started { sample_rate: u32 },
    Finished,
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesis_event_roundtrip() {
        let parsed: SynthesisEvent =
            serde_json::from_str(r#"{"type":"started","sample_rate":24000}"#).unwrap();
        assert_eq!(parsed, SynthesisEvent::Started { sample_rate: 24000 });
    }
}
