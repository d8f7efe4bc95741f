//! # Suggestion delivery and nudges
//!
//! Two pure components sitting between the turn tracker and the
//! presentation layer:
//!
//! - [`SuggestionScheduler`] decides *when* a computed suggestion becomes
//!   visible. Candidates race against turn-taking state: while the prospect
//!   is speaking they are parked (last-write-wins), stale generations are
//!   discarded once the current turn is served, and a fallback request is
//!   issued when the coaching computation stays silent too long.
//! - [`nudges::aggregate`] folds the locally computed talk-ratio signal and
//!   the service's advisory tags into a short, deduplicated list.
//!
//! The scheduler performs no I/O and holds no timers. It returns
//! [`Effect`]s; the session actor interprets them (arming timers, firing
//! network requests) and feeds the results back in as ordinary inputs.

pub mod config;
pub mod nudges;
pub mod scheduler;

pub use config::{CoachingConfig, NudgeConfig};
pub use nudges::{Nudge, NudgeCategory, Severity};
pub use scheduler::{Effect, SuggestionScheduler};
