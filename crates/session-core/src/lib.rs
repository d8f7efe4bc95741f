//! # Live-call coaching session runtime
//!
//! The orchestrator that turns independently-arriving event streams —
//! recognizer partials and finals, coaching signals, timer firings,
//! synthesized audio — into one consistent presentation state.
//!
//! Everything mutable lives inside a single session actor. External inputs
//! arrive as messages on its queue and handlers run to completion, so there
//! is exactly one interleaving to reason about and no shared-memory races.
//! Network calls never block the queue: the actor fires them on detached
//! tasks and reconciles the results when they come back as messages,
//! validated against the turn generation rather than assumed fresh.
//!
//! Hosts implement [`CoachRuntime`] to receive lifecycle events and the
//! [`CoachSnapshot`] re-emitted after every processed event.

pub mod actors;
mod events;
mod runtime;
mod session;

pub use events::{
    CoachSnapshot, DebugState, SessionErrorEvent, SessionLifecycleEvent, SessionProgressEvent,
};
pub use runtime::CoachRuntime;
pub use session::{SessionOptions, SessionParams};

/// Coarse runtime state reported by the root actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum State {
    Inactive,
    Active,
    Finalizing,
}
