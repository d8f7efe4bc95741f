use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

use ringside_call_audio::{
    CaptureHandle, FRAME_SAMPLES, PlaybackHandle, SAMPLE_RATE, WavRecorder, pcm, start_capture,
};
use ringside_coach_client::{SynthesisClient, user_friendly_error};
use ringside_coach_interface::synthesis::SynthesisEvent;
use ringside_coach_interface::{ControlMessage, MixedMessage, SynthesisResponse};

use super::session::SessionMsg;
use super::{actor_error, session_span};
use crate::events::{SessionErrorEvent, SessionProgressEvent};
use crate::CoachRuntime;

const SYNTH_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

pub enum BridgeMsg {
    /// One inbound frame from the synthesis channel.
    Downlink(SynthesisResponse),
    /// The uplink frame channel closed (overrun or capture teardown).
    UplinkClosed,
    /// The synthesis stream ended.
    DownlinkClosed,
}

pub struct BridgeArgs {
    pub runtime: Arc<dyn CoachRuntime>,
    pub session: ActorRef<SessionMsg>,
    pub session_id: String,
    pub synthesis_base_url: String,
    pub synthesis_api_key: String,
    pub record_path: Option<PathBuf>,
}

pub struct BridgeState {
    runtime: Arc<dyn CoachRuntime>,
    session: ActorRef<SessionMsg>,
    session_id: String,
    capture: Option<CaptureHandle>,
    playback: Option<PlaybackHandle>,
    playback_tx: Option<mpsc::Sender<Vec<f32>>>,
    uplink_task: Option<tokio::task::JoinHandle<()>>,
    rx_task: Option<tokio::task::JoinHandle<()>>,
}

/// Two independent pipelines over one duplex channel.
///
/// Uplink: capture callback → fixed i16-LE frames → depth-1 channel →
/// WebSocket, each frame sent as soon as it is produced. Downlink: inbound
/// chunks → decode → FIFO playback driver, back-to-back. The bridge holds
/// both device handles; stopping the actor releases them on every exit
/// path.
pub struct BridgeActor;

#[ractor::async_trait]
impl Actor for BridgeActor {
    type Msg = BridgeMsg;
    type State = BridgeState;
    type Arguments = BridgeArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: BridgeArgs,
    ) -> Result<Self::State, ActorProcessingErr> {
        let span = session_span(&args.session_id);

        async {
            // stale audio is worse than a gap: one frame of buffer, and an
            // overrun closes the uplink instead of queueing
            let (frames_tx, frames_rx) = mpsc::channel::<Bytes>(1);
            let capture = start_capture(frames_tx)?;
            let playback = PlaybackHandle::spawn(SAMPLE_RATE)?;
            let playback_tx = playback
                .sender()
                .ok_or_else(|| actor_error("playback driver unavailable"))?;

            let recorder = match &args.record_path {
                Some(path) => Some(WavRecorder::create(path, SAMPLE_RATE)?),
                None => None,
            };

            let (out_tx, out_rx) = mpsc::channel::<MixedMessage<Bytes, ControlMessage>>(4);
            let uplink_task = spawn_uplink_task(frames_rx, out_tx, recorder, myself.clone());

            let client = SynthesisClient::builder()
                .api_base(args.synthesis_base_url.as_str())
                .api_key(args.synthesis_api_key.as_str())
                .sample_rate(SAMPLE_RATE)
                .build()
                .map_err(|e| actor_error(user_friendly_error(&e)))?;

            let inbound = tokio::time::timeout(
                SYNTH_CONNECT_TIMEOUT,
                client.stream_duplex(ReceiverStream::new(out_rx)),
            )
            .await
            .map_err(|_| actor_error("synthesis_connect_timeout"))?
            .map_err(|e| actor_error(user_friendly_error(&e)))?;

            let rx_task = {
                let myself = myself.clone();
                let runtime = args.runtime.clone();
                let session_id = args.session_id.clone();
                tokio::spawn(async move {
                    futures_util::pin_mut!(inbound);
                    while let Some(item) = inbound.next().await {
                        match item {
                            Ok(response) => {
                                if myself.send_message(BridgeMsg::Downlink(response)).is_err() {
                                    return;
                                }
                            }
                            Err(e) => {
                                runtime.emit_error(SessionErrorEvent::Synthesis {
                                    session_id: session_id.clone(),
                                    error: user_friendly_error(&e),
                                });
                                break;
                            }
                        }
                    }
                    let _ = myself.send_message(BridgeMsg::DownlinkClosed);
                })
            };

            args.runtime.emit_progress(SessionProgressEvent::AudioReady {
                session_id: args.session_id.clone(),
                device: capture.device_name().map(str::to_string),
            });
            tracing::info!("bridge_started");

            Ok(BridgeState {
                runtime: args.runtime,
                session: args.session,
                session_id: args.session_id,
                capture: Some(capture),
                playback: Some(playback),
                playback_tx: Some(playback_tx),
                uplink_task: Some(uplink_task),
                rx_task: Some(rx_task),
            })
        }
        .instrument(span)
        .await
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            BridgeMsg::Downlink(SynthesisResponse::Audio(bytes)) => {
                let samples = pcm::bytes_to_f32_samples(&bytes);
                drop(bytes);
                let Some(tx) = state.playback_tx.as_ref() else {
                    return Ok(());
                };
                if tx.send(samples).await.is_err() {
                    state.report_down("playback driver stopped");
                    myself.stop(None);
                }
            }
            BridgeMsg::Downlink(SynthesisResponse::Event(event)) => match event {
                SynthesisEvent::Error { message } => {
                    state.runtime.emit_error(SessionErrorEvent::Synthesis {
                        session_id: state.session_id.clone(),
                        error: message.clone(),
                    });
                    state.report_down(&format!("synthesis error: {message}"));
                    myself.stop(None);
                }
                other => {
                    tracing::debug!(event = ?other, "synthesis_event");
                }
            },
            BridgeMsg::UplinkClosed => {
                let reason = if state.capture.as_ref().is_some_and(CaptureHandle::overran) {
                    "capture overrun"
                } else {
                    "capture stopped"
                };
                state.report_down(reason);
                myself.stop(None);
            }
            BridgeMsg::DownlinkClosed => {
                state.report_down("synthesis stream closed");
                myself.stop(None);
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        // release order: mic first (closes the frame channel and ends the
        // uplink task), then the playback device; nothing may outlive this
        drop(state.capture.take());
        if let Some(mut task) = state.uplink_task.take()
            && tokio::time::timeout(Duration::from_secs(2), &mut task)
                .await
                .is_err()
        {
            // a wedged websocket sink must not hold teardown hostage
            task.abort();
        }
        if let Some(task) = state.rx_task.take() {
            task.abort();
        }
        drop(state.playback_tx.take());
        if let Some(playback) = state.playback.take() {
            playback.shutdown(false);
        }
        tracing::info!("bridge_released");
        Ok(())
    }
}

impl BridgeState {
    fn report_down(&self, reason: &str) {
        let _ = self.session.send_message(SessionMsg::BridgeDown {
            reason: reason.to_string(),
        });
    }
}

fn spawn_uplink_task(
    mut frames_rx: mpsc::Receiver<Bytes>,
    out_tx: mpsc::Sender<MixedMessage<Bytes, ControlMessage>>,
    mut recorder: Option<WavRecorder>,
    myself: ActorRef<BridgeMsg>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut keepalive = tokio::time::interval(KEEPALIVE_INTERVAL);
        keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                frame = frames_rx.recv() => match frame {
                    Some(frame) => {
                        debug_assert!(frame.len() <= FRAME_SAMPLES * 2);
                        if let Some(rec) = recorder.as_mut()
                            && let Err(e) = rec.write_frame(&frame)
                        {
                            tracing::warn!(error = %e, "recording_failed_disabling");
                            recorder = None;
                        }
                        if out_tx.send(MixedMessage::Audio(frame)).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        let _ = out_tx
                            .send(MixedMessage::Control(ControlMessage::CloseStream))
                            .await;
                        let _ = myself.send_message(BridgeMsg::UplinkClosed);
                        break;
                    }
                },
                _ = keepalive.tick() => {
                    // only matters while the mic is silent; skipped if the
                    // channel is busy with audio
                    let _ = out_tx.try_send(MixedMessage::Control(ControlMessage::KeepAlive));
                }
            }
        }

        if let Some(mut rec) = recorder.take()
            && let Err(e) = rec.finalize()
        {
            tracing::warn!(error = %e, "recording_finalize_failed");
        }
    })
}
