use crate::events::*;

/// Host-facing event sink. The desktop shell, a test harness, and the CLI
/// each implement this once; everything the session produces goes through
/// it.
pub trait CoachRuntime: Send + Sync {
    fn emit_lifecycle(&self, event: SessionLifecycleEvent);
    fn emit_progress(&self, event: SessionProgressEvent);
    fn emit_error(&self, event: SessionErrorEvent);
    fn emit_snapshot(&self, snapshot: CoachSnapshot);
}
