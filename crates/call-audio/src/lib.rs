//! # Practice-call audio plumbing
//!
//! Building blocks for the practice-mode audio bridge: PCM frame codecs,
//! microphone capture, strictly ordered playback, and an optional WAV
//! recorder. Device handles are scoped — dropping a handle releases the
//! underlying stream on every exit path, including error paths.
//!
//! The uplink deliberately buffers at most one frame. Synthesized speech is
//! conversational; sending stale microphone audio after a stall is worse
//! than a gap, so an overrun closes the channel instead of queueing.

mod error;
pub mod capture;
pub mod pcm;
pub mod playback;
pub mod recorder;

pub use capture::{CaptureHandle, start_capture};
pub use error::Error;
pub use pcm::FrameChunker;
pub use playback::{PlaybackHandle, PlaybackQueue, ScheduledChunk};
pub use recorder::WavRecorder;

/// Wire sample rate for both uplink and downlink PCM.
pub const SAMPLE_RATE: u32 = 16_000;

/// Samples per uplink frame (20 ms at 16 kHz).
pub const FRAME_SAMPLES: usize = 320;
