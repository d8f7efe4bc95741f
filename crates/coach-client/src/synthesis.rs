use bytes::Bytes;
use futures_util::{SinkExt, Stream, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{ClientRequestBuilder, Message};

use ringside_coach_interface::synthesis::SynthesisEvent;
use ringside_coach_interface::{ControlMessage, MixedMessage, SynthesisResponse};

use crate::Error;

/// Duplex WebSocket client for the voice-synthesis collaborator.
///
/// Uplink: microphone PCM frames and control messages, transmitted as they
/// are produced. Downlink: synthesized audio chunks in arrival order —
/// arrival order is the playback contract, there is no reordering buffer.
pub struct SynthesisClient {
    request: ClientRequestBuilder,
}

pub struct SynthesisClientBuilder {
    api_base: Option<String>,
    api_key: Option<String>,
    sample_rate: u32,
}

impl SynthesisClient {
    pub fn builder() -> SynthesisClientBuilder {
        SynthesisClientBuilder {
            api_base: None,
            api_key: None,
            sample_rate: 16_000,
        }
    }

    /// Open the channel. The returned stream yields synthesized audio and
    /// control events until the server closes or the outbound stream ends;
    /// dropping it tears the connection down.
    pub async fn stream_duplex<S>(
        self,
        outbound: S,
    ) -> Result<impl Stream<Item = Result<SynthesisResponse, Error>>, Error>
    where
        S: Stream<Item = MixedMessage<Bytes, ControlMessage>> + Send + Unpin + 'static,
    {
        let (ws, _) = connect_async(self.request).await?;
        let (mut sink, mut source) = ws.split();

        let send_task = tokio::spawn(async move {
            let mut outbound = outbound;
            while let Some(message) = outbound.next().await {
                let frame = match message {
                    MixedMessage::Audio(bytes) => Message::Binary(bytes),
                    MixedMessage::Control(control) => match serde_json::to_string(&control) {
                        Ok(json) => Message::Text(json.into()),
                        Err(e) => {
                            tracing::error!(error = %e, "synthesis_control_encode_failed");
                            continue;
                        }
                    },
                };
                if sink.send(frame).await.is_err() {
                    break;
                }
            }
            let _ = sink.send(Message::Close(None)).await;
        });

        let inbound = async_stream::stream! {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Binary(bytes)) => {
                        yield Ok(SynthesisResponse::Audio(bytes));
                    }
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<SynthesisEvent>(text.as_str()) {
                            Ok(event) => yield Ok(SynthesisResponse::Event(event)),
                            Err(e) => {
                                // unknown control frames are dropped, same
                                // forward-compatibility stance as advisory tags
                                tracing::warn!(error = %e, "synthesis_event_parse_failed");
                            }
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(Error::Ws(e));
                        break;
                    }
                }
            }
            send_task.abort();
        };

        Ok(inbound)
    }
}

impl SynthesisClientBuilder {
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn build(self) -> Result<SynthesisClient, Error> {
        let api_base = self.api_base.unwrap_or_default();
        let url = build_ws_url(&api_base, self.sample_rate)?;
        let uri = url
            .to_string()
            .parse()
            .map_err(|_| Error::InvalidUrl(url.to_string()))?;

        let mut request = ClientRequestBuilder::new(uri);
        if let Some(key) = self.api_key.filter(|k| !k.is_empty()) {
            request = request.with_header("Authorization", format!("Bearer {key}"));
        }

        Ok(SynthesisClient { request })
    }
}

fn build_ws_url(api_base: &str, sample_rate: u32) -> Result<url::Url, Error> {
    let mut url =
        url::Url::parse(api_base).map_err(|_| Error::InvalidUrl(api_base.to_string()))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(Error::InvalidUrl(format!("unsupported scheme: {other}"))),
    };
    url.set_scheme(scheme)
        .map_err(|_| Error::InvalidUrl(api_base.to_string()))?;

    let mut url = url
        .join("v1/synthesize")
        .map_err(|_| Error::InvalidUrl(api_base.to_string()))?;
    url.query_pairs_mut()
        .append_pair("sample_rate", &sample_rate.to_string())
        .append_pair("encoding", "linear16");

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_carries_sample_rate_and_encoding() {
        let url = build_ws_url("https://synth.example.com/", 16_000).unwrap();
        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.path(), "/v1/synthesize");
        assert!(url.query().unwrap().contains("sample_rate=16000"));
        assert!(url.query().unwrap().contains("encoding=linear16"));
    }

    #[test]
    fn http_scheme_downgrades_to_ws() {
        let url = build_ws_url("http://localhost:8080/", 16_000).unwrap();
        assert_eq!(url.scheme(), "ws");
    }

    #[test]
    fn garbage_base_is_rejected() {
        assert!(build_ws_url("not a url", 16_000).is_err());
    }
}
