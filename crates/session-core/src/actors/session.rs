use std::sync::Arc;

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort, SupervisionEvent};
use tracing::Instrument;

use ringside_coach_client::{CallControlClient, CoachClient, user_friendly_error};
use ringside_coach_interface::{
    CallMode, CallPhase, CoachSignal, RecognizerEvent, SuggestionCandidate,
};
use ringside_coaching::{Effect, SuggestionScheduler, nudges};
use ringside_turns::{CallStats, TurnLog, TurnTracker};

use super::bridge::{BridgeActor, BridgeArgs, BridgeMsg};
use super::{actor_error, session_span};
use crate::events::*;
use crate::{CoachRuntime, SessionParams};

/// Every external input the session reacts to, delivered on one logical
/// queue. Handlers run to completion, so presentation-state transitions
/// happen in exactly the order these messages are received.
pub enum SessionMsg {
    /// A partial or final utterance from the recognizer.
    Recognizer(RecognizerEvent),
    /// An asynchronous message from the coaching computation.
    Coach(CoachSignal),
    /// Call-control reports the callee picked up.
    CallAnswered,
    /// User aborts while still ringing.
    Cancel,
    /// User (or call-control) ends the call.
    Hangup,
    /// Call-control reports the call could not be completed (busy,
    /// rejected, line error).
    CallFailed { reason: String },
    /// User asks for the "more options" side list.
    RequestAlternatives,
    /// User picked one of the alternatives.
    SelectAlternative { text: String },
    /// The fallback timer armed at a prospect finalization elapsed.
    FallbackTimer { generation: u64 },
    /// A fallback network request came back; `None` means it failed.
    FallbackResolved {
        generation: u64,
        candidate: Option<SuggestionCandidate>,
    },
    AlternativesResolved {
        result: Result<Vec<SuggestionCandidate>, String>,
    },
    /// The practice-audio bridge is gone; keep coaching, drop audio.
    BridgeDown { reason: String },
    Snapshot(RpcReplyPort<CoachSnapshot>),
}

pub struct SessionArgs {
    pub runtime: Arc<dyn CoachRuntime>,
    pub params: SessionParams,
}

pub struct SessionState {
    runtime: Arc<dyn CoachRuntime>,
    params: SessionParams,
    phase: CallPhase,
    log: TurnLog,
    tracker: TurnTracker,
    scheduler: SuggestionScheduler,
    advisory_tags: Vec<String>,
    alternatives: Vec<SuggestionCandidate>,
    alternatives_in_flight: bool,
    coach: Option<CoachClient>,
    call_control: Option<CallControlClient>,
    bridge: Option<ActorRef<BridgeMsg>>,
    bridge_active: bool,
}

pub struct SessionActor;

#[ractor::async_trait]
impl Actor for SessionActor {
    type Msg = SessionMsg;
    type State = SessionState;
    type Arguments = SessionArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: SessionArgs,
    ) -> Result<Self::State, ActorProcessingErr> {
        let span = session_span(&args.params.session_id);

        async {
            let coach = if args.params.coach_base_url.is_empty() {
                None
            } else {
                Some(
                    CoachClient::new(&args.params.coach_base_url, &args.params.coach_api_key)
                        .map_err(actor_error)?,
                )
            };

            let call_control = if args.params.call_control_base_url.is_empty() {
                None
            } else {
                Some(
                    CallControlClient::new(
                        &args.params.call_control_base_url,
                        &args.params.coach_api_key,
                    )
                    .map_err(actor_error)?,
                )
            };

            if let Some(call_control) = &call_control {
                args.runtime.emit_progress(SessionProgressEvent::Connecting {
                    session_id: args.params.session_id.clone(),
                });
                call_control
                    .notify_started(&args.params.session_id)
                    .await
                    .map_err(|e| actor_error(user_friendly_error(&e)))?;
                args.runtime.emit_progress(SessionProgressEvent::Connected {
                    session_id: args.params.session_id.clone(),
                });
            }

            args.runtime
                .emit_lifecycle(SessionLifecycleEvent::Ringing {
                    session_id: args.params.session_id.clone(),
                });
            tracing::info!("session_ringing");

            let tracker = TurnTracker::new(args.params.tracker);

            let state = SessionState {
                runtime: args.runtime,
                params: args.params,
                phase: CallPhase::Initiated,
                log: TurnLog::new(),
                tracker,
                scheduler: SuggestionScheduler::new(),
                advisory_tags: Vec::new(),
                alternatives: Vec::new(),
                alternatives_in_flight: false,
                coach,
                call_control,
                bridge: None,
                bridge_active: false,
            };
            state.publish();
            Ok(state)
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
        let span = session_span(&state.params.session_id);

        async {
            match message {
                SessionMsg::Snapshot(reply) => {
                    let _ = reply.send(state.snapshot());
                    return Ok(());
                }
                _ if state.phase.is_terminal() => return Ok(()),
                SessionMsg::Recognizer(event) => on_recognizer(&myself, state, event),
                SessionMsg::Coach(signal) => on_coach_signal(&myself, state, signal),
                SessionMsg::CallAnswered => on_call_answered(&myself, state).await,
                SessionMsg::Cancel => {
                    if state.phase == CallPhase::Initiated {
                        tracing::info!("session_cancelled_before_answer");
                        end_session(&myself, state, CallPhase::Ended, None).await;
                    } else {
                        tracing::warn!(phase = ?state.phase, "cancel_ignored_outside_initiated");
                    }
                }
                SessionMsg::Hangup => {
                    end_session(&myself, state, CallPhase::Ended, None).await;
                }
                SessionMsg::CallFailed { reason } => {
                    end_session(&myself, state, CallPhase::Failed, Some(reason)).await;
                }
                SessionMsg::RequestAlternatives => on_request_alternatives(&myself, state),
                SessionMsg::SelectAlternative { text } => {
                    let effects = state.scheduler.on_alternative_selected(text);
                    state.alternatives.clear();
                    apply_effects(&myself, state, effects);
                    state.publish();
                }
                SessionMsg::FallbackTimer { generation } => {
                    let effects = state.scheduler.on_fallback_elapsed(generation);
                    apply_effects(&myself, state, effects);
                }
                SessionMsg::FallbackResolved {
                    generation,
                    candidate,
                } => {
                    let effects = state.scheduler.on_fallback_resolved(generation, candidate);
                    apply_effects(&myself, state, effects);
                    state.publish();
                }
                SessionMsg::AlternativesResolved { result } => {
                    state.alternatives_in_flight = false;
                    match result {
                        Ok(candidates) => state.alternatives = candidates,
                        Err(error) => state.runtime.emit_error(SessionErrorEvent::Coaching {
                            session_id: state.params.session_id.clone(),
                            error,
                        }),
                    }
                    state.publish();
                }
                SessionMsg::BridgeDown { reason } => {
                    tracing::warn!(%reason, "audio_bridge_down");
                    state.bridge = None;
                    state.bridge_active = false;
                    state
                        .runtime
                        .emit_progress(SessionProgressEvent::AudioDegraded {
                            session_id: state.params.session_id.clone(),
                            error: reason,
                        });
                    state.publish();
                }
            }
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn handle_supervisor_evt(
        &self,
        myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisionEvent::ActorTerminated(cell, _, reason) => {
                if state.bridge.as_ref().is_some_and(|b| b.get_id() == cell.get_id()) {
                    let _ = myself.send_message(SessionMsg::BridgeDown {
                        reason: reason.unwrap_or_else(|| "bridge stopped".to_string()),
                    });
                }
            }
            SupervisionEvent::ActorFailed(cell, error) => {
                if state.bridge.as_ref().is_some_and(|b| b.get_id() == cell.get_id()) {
                    let _ = myself.send_message(SessionMsg::BridgeDown {
                        reason: format!("bridge failed: {error:?}"),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        // safety net for abnormal stops; the normal path tears the bridge
        // down inside end_session before the phase transition
        stop_bridge(state).await;
        Ok(())
    }
}

fn on_recognizer(myself: &ActorRef<SessionMsg>, state: &mut SessionState, event: RecognizerEvent) {
    if state.phase != CallPhase::InProgress {
        tracing::debug!(phase = ?state.phase, "recognizer_event_outside_call");
        return;
    }

    let Some(outcome) = state.log.apply(&event) else {
        return;
    };

    let transition = state.tracker.observe_merge(outcome, event.timestamp_ms);
    let effects = state.scheduler.on_transition(&transition);
    apply_effects(myself, state, effects);
    state.publish();
}

fn on_coach_signal(myself: &ActorRef<SessionMsg>, state: &mut SessionState, signal: CoachSignal) {
    if state.phase != CallPhase::InProgress {
        tracing::debug!(phase = ?state.phase, "coach_signal_outside_call");
        return;
    }

    match signal {
        CoachSignal::Suggestion(candidate) => {
            let effects = state.scheduler.on_candidate(candidate);
            apply_effects(myself, state, effects);
            state.publish();
        }
        CoachSignal::Advisory { tags } => {
            state.advisory_tags = tags;
            state.publish();
        }
        CoachSignal::Speaking {
            speaker,
            timestamp_ms,
        } => {
            let transition = state.tracker.observe_speaking(speaker, timestamp_ms);
            let effects = state.scheduler.on_transition(&transition);
            apply_effects(myself, state, effects);
            state.publish();
        }
        CoachSignal::Error { message } => {
            state.runtime.emit_error(SessionErrorEvent::Coaching {
                session_id: state.params.session_id.clone(),
                error: message,
            });
        }
        _ => {}
    }
}

async fn on_call_answered(myself: &ActorRef<SessionMsg>, state: &mut SessionState) {
    if !state.phase.can_transition_to(CallPhase::InProgress) {
        tracing::warn!(phase = ?state.phase, "call_answered_in_unexpected_phase");
        return;
    }

    state.phase = CallPhase::InProgress;
    state
        .runtime
        .emit_lifecycle(SessionLifecycleEvent::Active {
            session_id: state.params.session_id.clone(),
        });
    tracing::info!("session_active");

    if state.params.mode == CallMode::Practice {
        start_bridge(myself, state).await;
    }

    state.publish();
}

async fn start_bridge(myself: &ActorRef<SessionMsg>, state: &mut SessionState) {
    if state.params.synthesis_base_url.is_empty() {
        state
            .runtime
            .emit_progress(SessionProgressEvent::AudioDegraded {
                session_id: state.params.session_id.clone(),
                error: "no synthesis endpoint configured".to_string(),
            });
        return;
    }

    let args = BridgeArgs {
        runtime: state.runtime.clone(),
        session: myself.clone(),
        session_id: state.params.session_id.clone(),
        synthesis_base_url: state.params.synthesis_base_url.clone(),
        synthesis_api_key: state.params.synthesis_api_key.clone(),
        record_path: state.params.record_path.clone(),
    };

    match Actor::spawn_linked(None, BridgeActor, args, myself.get_cell()).await {
        Ok((bridge, _)) => {
            state.bridge = Some(bridge);
            state.bridge_active = true;
        }
        Err(e) => {
            // practice degrades to transcript-only coaching, never crashes
            tracing::warn!(error = ?e, "bridge_spawn_failed_degrading");
            state
                .runtime
                .emit_progress(SessionProgressEvent::AudioDegraded {
                    session_id: state.params.session_id.clone(),
                    error: format!("{e}"),
                });
        }
    }
}

fn on_request_alternatives(myself: &ActorRef<SessionMsg>, state: &mut SessionState) {
    if state.alternatives_in_flight {
        return;
    }
    let Some(coach) = state.coach.clone() else {
        return;
    };

    state.alternatives_in_flight = true;
    let myself = myself.clone();
    let session_id = state.params.session_id.clone();
    let count = state.params.coaching.alternatives_count;

    tokio::spawn(async move {
        let result = coach
            .request_alternatives(&session_id, count)
            .await
            .map_err(|e| user_friendly_error(&e));
        let _ = myself.send_message(SessionMsg::AlternativesResolved { result });
    });
}

fn apply_effects(myself: &ActorRef<SessionMsg>, state: &SessionState, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            // the visible suggestion lives in the scheduler; snapshots read
            // it from there
            Effect::Show(_) | Effect::Clear => {}
            Effect::ArmFallback { generation } => {
                let _ = myself.send_after(state.params.coaching.fallback_delay, move || {
                    SessionMsg::FallbackTimer { generation }
                });
            }
            Effect::RequestFallback { generation } => {
                spawn_fallback_request(myself, state, generation);
            }
        }
    }
}

fn spawn_fallback_request(
    myself: &ActorRef<SessionMsg>,
    state: &SessionState,
    generation: u64,
) {
    let Some(coach) = state.coach.clone() else {
        // no collaborator configured; resolve empty so the in-flight
        // bookkeeping does not wedge
        let _ = myself.send_message(SessionMsg::FallbackResolved {
            generation,
            candidate: None,
        });
        return;
    };

    let myself = myself.clone();
    let runtime = state.runtime.clone();
    let session_id = state.params.session_id.clone();

    tokio::spawn(async move {
        tracing::debug!(generation, "fallback_request_fired");
        let candidate = match coach.request_fallback(&session_id, generation).await {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                runtime.emit_error(SessionErrorEvent::Coaching {
                    session_id: session_id.clone(),
                    error: user_friendly_error(&e),
                });
                None
            }
        };
        let _ = myself.send_message(SessionMsg::FallbackResolved {
            generation,
            candidate,
        });
    });
}

/// Terminal transition. The bridge (and with it both audio devices) is
/// released before the phase flips — by the time a lifecycle event says
/// `Ended`, nothing is still capturing or playing.
async fn end_session(
    myself: &ActorRef<SessionMsg>,
    state: &mut SessionState,
    next: CallPhase,
    error: Option<String>,
) {
    stop_bridge(state).await;

    if state.phase.can_transition_to(next) {
        state.phase = next;
    }

    let session_id = state.params.session_id.clone();
    match (next, error) {
        (CallPhase::Failed, error) => {
            state.runtime.emit_lifecycle(SessionLifecycleEvent::Failed {
                session_id: session_id.clone(),
                error: error.unwrap_or_else(|| "unknown".to_string()),
            });
        }
        _ => {
            state.runtime.emit_lifecycle(SessionLifecycleEvent::Ended {
                session_id: session_id.clone(),
            });
        }
    }
    tracing::info!(phase = ?state.phase, "session_over");
    state.publish();

    // optimistic local transition: the remote notification happens off the
    // queue, and a delivery failure surfaces as a warning, not a rollback
    if let Some(call_control) = state.call_control.clone() {
        let runtime = state.runtime.clone();
        tokio::spawn(async move {
            if let Err(e) = call_control.notify_ended(&session_id).await {
                runtime.emit_error(SessionErrorEvent::CallControlWarning {
                    session_id,
                    error: user_friendly_error(&e),
                });
            }
        });
    }

    myself.stop(None);
}

async fn stop_bridge(state: &mut SessionState) {
    if let Some(bridge) = state.bridge.take() {
        state.bridge_active = false;
        if let Err(e) = bridge
            .stop_and_wait(None, Some(std::time::Duration::from_secs(5)))
            .await
        {
            tracing::warn!(error = ?e, "bridge_stop_failed");
        }
    }
}

impl SessionState {
    fn snapshot(&self) -> CoachSnapshot {
        let stats = CallStats::from_entries(self.log.entries());
        CoachSnapshot {
            session_id: self.params.session_id.clone(),
            phase: self.phase,
            speaking: self.tracker.state(),
            suggestion: self.scheduler.visible().cloned(),
            alternatives: self.alternatives.clone(),
            nudges: nudges::aggregate(&stats, &self.advisory_tags, &self.params.coaching.nudges),
            transcript: self.log.entries().to_vec(),
            bridge_active: self.bridge_active,
            debug: self.params.options.debug_overlay.then(|| DebugState {
                turn_generation: self.tracker.turn_generation(),
                has_prospect_spoken: self.tracker.has_prospect_spoken(),
            }),
        }
    }

    fn publish(&self) {
        self.runtime.emit_snapshot(self.snapshot());
    }
}
