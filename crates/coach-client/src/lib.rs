//! Clients for the orchestrator's external collaborators: the coaching
//! computation (HTTP), the call-control service (HTTP), and the
//! voice-synthesis duplex channel (WebSocket, practice mode only).
//!
//! All of them are fire-and-forget from the session actor's perspective —
//! results come back as messages stamped with enough context (the turn
//! generation) to be validated against present state instead of assumed
//! still relevant.

mod call_control;
mod coach;
mod error;
mod synthesis;

pub use call_control::CallControlClient;
pub use coach::CoachClient;
pub use error::{Error, user_friendly_error};
pub use synthesis::{SynthesisClient, SynthesisClientBuilder};
