use std::sync::Arc;

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort, SupervisionEvent};
use tracing::Instrument;

use super::session::{SessionActor, SessionArgs, SessionMsg};
use super::session_span;
use crate::events::SessionLifecycleEvent;
use crate::{CoachRuntime, SessionParams, State};

pub enum RootMsg {
    StartSession(SessionParams, RpcReplyPort<bool>),
    StopSession(RpcReplyPort<()>),
    /// Forward one input to the running session, if any.
    Deliver(SessionMsg),
    GetState(RpcReplyPort<State>),
}

pub struct RootArgs {
    pub runtime: Arc<dyn CoachRuntime>,
}

pub struct RootState {
    runtime: Arc<dyn CoachRuntime>,
    session_id: Option<String>,
    session: Option<ActorRef<SessionMsg>>,
    finalizing: bool,
}

/// Singleton entry point: owns at most one live session, supervises it,
/// and reports a failure the session itself could not.
pub struct RootActor;

impl RootActor {
    pub fn name() -> ractor::ActorName {
        "coach_root_actor".into()
    }
}

#[ractor::async_trait]
impl Actor for RootActor {
    type Msg = RootMsg;
    type State = RootState;
    type Arguments = RootArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        Ok(RootState {
            runtime: args.runtime,
            session_id: None,
            session: None,
            finalizing: false,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            RootMsg::StartSession(params, reply) => {
                let started = start_session_impl(&myself, params, state).await;
                let _ = reply.send(started);
            }
            RootMsg::StopSession(reply) => {
                if let Some(session) = &state.session {
                    state.finalizing = true;
                    if let Err(error) = session.send_message(SessionMsg::Hangup) {
                        tracing::warn!(?error, "failed_to_send_hangup_stopping_hard");
                        session.stop(Some("hangup_send_failed".to_string()));
                    }
                }
                let _ = reply.send(());
            }
            RootMsg::Deliver(msg) => {
                if let Some(session) = &state.session {
                    let _ = session.send_message(msg);
                } else {
                    tracing::debug!("input_dropped_no_session");
                }
            }
            RootMsg::GetState(reply) => {
                let fsm = if state.finalizing {
                    State::Finalizing
                } else if state.session.is_some() {
                    State::Active
                } else {
                    State::Inactive
                };
                let _ = reply.send(fsm);
            }
        }
        Ok(())
    }

    async fn handle_supervisor_evt(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisionEvent::ActorStarted(_) | SupervisionEvent::ProcessGroupChanged(_) => {}
            SupervisionEvent::ActorTerminated(cell, _, reason) => {
                if state.session.as_ref().is_some_and(|s| s.get_id() == cell.get_id()) {
                    let session_id = state.session_id.take().unwrap_or_default();
                    let span = session_span(&session_id);
                    let _guard = span.enter();
                    tracing::info!(?reason, "session_terminated");
                    state.session = None;
                    state.finalizing = false;
                }
            }
            SupervisionEvent::ActorFailed(cell, error) => {
                if state.session.as_ref().is_some_and(|s| s.get_id() == cell.get_id()) {
                    let session_id = state.session_id.take().unwrap_or_default();
                    let span = session_span(&session_id);
                    let _guard = span.enter();
                    tracing::warn!(?error, "session_failed");
                    state.session = None;
                    state.finalizing = false;

                    // the session died without running its own terminal
                    // transition; report the failure on its behalf
                    state.runtime.emit_lifecycle(SessionLifecycleEvent::Failed {
                        session_id,
                        error: format!("{error:?}"),
                    });
                }
            }
        }
        Ok(())
    }
}

async fn start_session_impl(
    myself: &ActorRef<RootMsg>,
    params: SessionParams,
    state: &mut RootState,
) -> bool {
    let session_id = params.session_id.clone();
    let span = session_span(&session_id);

    async {
        if state.session.is_some() {
            tracing::warn!("session_already_running");
            return false;
        }

        let args = SessionArgs {
            runtime: state.runtime.clone(),
            params,
        };

        match Actor::spawn_linked(None, SessionActor, args, myself.get_cell()).await {
            Ok((session, _handle)) => {
                state.session_id = Some(session_id.clone());
                state.session = Some(session);
                tracing::info!("session_started");
                true
            }
            Err(e) => {
                tracing::error!(error = ?e, "failed_to_start_session");
                false
            }
        }
    }
    .instrument(span)
    .await
}
