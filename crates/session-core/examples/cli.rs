use std::sync::Arc;

use ractor::Actor;

use ringside_coach_interface::{CallMode, RecognizerEvent, Speaker};
use session_core::actors::{RootActor, RootArgs, RootMsg, SessionMsg};
use session_core::{
    CoachRuntime, CoachSnapshot, SessionErrorEvent, SessionLifecycleEvent, SessionParams,
    SessionProgressEvent,
};

struct CliRuntime;

impl CoachRuntime for CliRuntime {
    fn emit_lifecycle(&self, event: SessionLifecycleEvent) {
        match &event {
            SessionLifecycleEvent::Ringing { session_id } => {
                eprintln!("[lifecycle] ringing session={session_id}");
            }
            SessionLifecycleEvent::Active { session_id } => {
                eprintln!("[lifecycle] active session={session_id}");
            }
            SessionLifecycleEvent::Ended { session_id } => {
                eprintln!("[lifecycle] ended session={session_id}");
            }
            SessionLifecycleEvent::Failed { session_id, error } => {
                eprintln!("[lifecycle] failed session={session_id} error={error}");
            }
        }
    }

    fn emit_progress(&self, event: SessionProgressEvent) {
        match &event {
            SessionProgressEvent::Connecting { .. } => eprintln!("[progress] connecting..."),
            SessionProgressEvent::Connected { .. } => eprintln!("[progress] connected"),
            SessionProgressEvent::AudioReady { device, .. } => {
                eprintln!("[progress] audio ready device={device:?}");
            }
            SessionProgressEvent::AudioDegraded { error, .. } => {
                eprintln!("[progress] audio degraded: {error}");
            }
        }
    }

    fn emit_error(&self, event: SessionErrorEvent) {
        eprintln!("[error] {}", serde_json::to_string(&event).unwrap_or_default());
    }

    fn emit_snapshot(&self, snapshot: CoachSnapshot) {
        let suggestion = snapshot
            .suggestion
            .as_ref()
            .map(|s| s.text.as_str())
            .unwrap_or("—");
        let nudges: Vec<&str> = snapshot.nudges.iter().map(|n| n.label.as_str()).collect();
        eprintln!(
            "[snapshot] phase={:?} speaking={:?} suggestion={suggestion:?} nudges={nudges:?}",
            snapshot.phase, snapshot.speaking
        );
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mode = match std::env::var("COACH_MODE").as_deref() {
        Ok("practice") => CallMode::Practice,
        _ => CallMode::Live,
    };

    let params = SessionParams {
        session_id: uuid::Uuid::new_v4().to_string(),
        mode,
        coach_base_url: std::env::var("COACH_BASE_URL").unwrap_or_default(),
        coach_api_key: std::env::var("COACH_API_KEY").unwrap_or_default(),
        call_control_base_url: std::env::var("CALL_CONTROL_BASE_URL").unwrap_or_default(),
        synthesis_base_url: std::env::var("SYNTHESIS_BASE_URL").unwrap_or_default(),
        synthesis_api_key: std::env::var("SYNTHESIS_API_KEY").unwrap_or_default(),
        record_path: std::env::var("COACH_RECORD_PATH").ok().map(Into::into),
        options: Default::default(),
        coaching: Default::default(),
        tracker: Default::default(),
    };

    let (root, _handle) = Actor::spawn(
        Some(RootActor::name()),
        RootActor,
        RootArgs {
            runtime: Arc::new(CliRuntime),
        },
    )
    .await
    .expect("failed to spawn root actor");

    let started = ractor::call!(root, RootMsg::StartSession, params)
        .expect("failed to send start message");
    if !started {
        eprintln!("Failed to start session");
        std::process::exit(1);
    }

    root.cast(RootMsg::Deliver(SessionMsg::CallAnswered)).ok();

    eprintln!();
    eprintln!("Type transcript lines: 'p: ...' for the prospect, 'r: ...' for the rep.");
    eprintln!("Lines are treated as finalized turns. Ctrl+C (or EOF) ends the call.");
    eprintln!();

    let stdin = std::io::stdin();
    let start = std::time::Instant::now();
    loop {
        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let (speaker, text) = match line.trim().split_once(':') {
            Some(("p", rest)) => (Speaker::Prospect, rest.trim()),
            Some(("r", rest)) => (Speaker::Rep, rest.trim()),
            _ => {
                eprintln!("(unrecognized line, expected 'p: ...' or 'r: ...')");
                continue;
            }
        };
        if text.is_empty() {
            continue;
        }

        root.cast(RootMsg::Deliver(SessionMsg::Recognizer(RecognizerEvent {
            speaker,
            text: text.to_string(),
            timestamp_ms: start.elapsed().as_millis() as i64,
            is_final: true,
        })))
        .ok();
    }

    eprintln!("Ending session...");
    let _ = ractor::call!(root, RootMsg::StopSession);
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    eprintln!("Done.");
}
