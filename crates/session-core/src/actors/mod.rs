mod bridge;
mod root;
mod session;

pub use root::{RootActor, RootArgs, RootMsg};
pub use session::{SessionActor, SessionArgs, SessionMsg};

pub(crate) fn session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("session", session_id = %session_id)
}

pub(crate) fn actor_error(msg: impl std::fmt::Display) -> ractor::ActorProcessingErr {
    msg.to_string().into()
}
