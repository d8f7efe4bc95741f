//! # Turn log and turn-taking state
//!
//! The recognizer delivers partial and final utterances per speaker,
//! at-least-once. This crate normalizes that stream into two things the
//! rest of the system consumes:
//!
//! - [`TurnLog`] — an append-only ordered log where in-progress hypotheses
//!   replace each other in place instead of flooding the transcript, and
//!   finalized turns take a monotonically increasing sequence number.
//! - [`TurnTracker`] — "who is speaking now", driven by merge outcomes and
//!   by explicit speaking signals from the coaching service. The tracker
//!   owns the turn generation counter that the suggestion scheduler uses to
//!   reject stale results.
//!
//! Both are pure state machines: no clocks, no I/O. Time only enters as the
//! `timestamp_ms` carried on events, which keeps replays deterministic.

pub mod id;
pub mod log;
pub mod stats;
pub mod tracker;
mod types;

pub use id::{SequentialTurnIds, TurnIdGen, UuidTurnIds};
pub use log::{MergeOutcome, TurnLog};
pub use stats::CallStats;
pub use tracker::{TrackerConfig, Transition, TurnState, TurnTracker};
pub use types::TurnEntry;
