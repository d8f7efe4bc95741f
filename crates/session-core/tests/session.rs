use std::sync::{Arc, Mutex};
use std::time::Duration;

use ractor::Actor;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ringside_coach_interface::{CallMode, CallPhase, CoachSignal, RecognizerEvent, Speaker};
use session_core::actors::{RootActor, RootArgs, RootMsg, SessionMsg};
use session_core::{
    CoachRuntime, CoachSnapshot, SessionErrorEvent, SessionLifecycleEvent, SessionParams,
    SessionProgressEvent,
};

#[derive(Default)]
struct TestRuntime {
    lifecycle: Mutex<Vec<SessionLifecycleEvent>>,
    snapshots: Mutex<Vec<CoachSnapshot>>,
}

impl TestRuntime {
    fn lifecycle(&self) -> Vec<SessionLifecycleEvent> {
        self.lifecycle.lock().unwrap().clone()
    }

    fn last_snapshot(&self) -> Option<CoachSnapshot> {
        self.snapshots.lock().unwrap().last().cloned()
    }

    fn snapshots(&self) -> Vec<CoachSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }
}

impl CoachRuntime for TestRuntime {
    fn emit_lifecycle(&self, event: SessionLifecycleEvent) {
        self.lifecycle.lock().unwrap().push(event);
    }

    fn emit_progress(&self, _event: SessionProgressEvent) {}

    fn emit_error(&self, _event: SessionErrorEvent) {}

    fn emit_snapshot(&self, snapshot: CoachSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }
}

fn params(session_id: &str) -> SessionParams {
    SessionParams {
        session_id: session_id.to_string(),
        mode: CallMode::Live,
        coach_base_url: String::new(),
        coach_api_key: String::new(),
        call_control_base_url: String::new(),
        synthesis_base_url: String::new(),
        synthesis_api_key: String::new(),
        record_path: None,
        options: Default::default(),
        coaching: Default::default(),
        tracker: Default::default(),
    }
}

async fn start(
    runtime: Arc<TestRuntime>,
    params: SessionParams,
) -> ractor::ActorRef<RootMsg> {
    let (root, _) = Actor::spawn(None, RootActor, RootArgs { runtime })
        .await
        .expect("spawn root");
    let started = ractor::call!(root, RootMsg::StartSession, params).expect("call start");
    assert!(started);
    root
}

fn deliver(root: &ractor::ActorRef<RootMsg>, msg: SessionMsg) {
    root.cast(RootMsg::Deliver(msg)).expect("deliver");
}

fn prospect_final(text: &str, at: i64) -> SessionMsg {
    SessionMsg::Recognizer(RecognizerEvent {
        speaker: Speaker::Prospect,
        text: text.to_string(),
        timestamp_ms: at,
        is_final: true,
    })
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}

// Cancelling while still ringing must land directly in ENDED without
// ever passing through IN_PROGRESS.
#[tokio::test]
async fn cancellation_skips_in_progress() {
    let runtime = Arc::new(TestRuntime::default());
    let root = start(runtime.clone(), params("cancel-test")).await;
    settle().await;

    deliver(&root, SessionMsg::Cancel);
    settle().await;

    let lifecycle = runtime.lifecycle();
    assert!(matches!(lifecycle[0], SessionLifecycleEvent::Ringing { .. }));
    assert!(matches!(lifecycle[1], SessionLifecycleEvent::Ended { .. }));
    assert!(
        !lifecycle
            .iter()
            .any(|e| matches!(e, SessionLifecycleEvent::Active { .. }))
    );

    assert!(
        runtime
            .snapshots()
            .iter()
            .all(|s| s.phase != CallPhase::InProgress)
    );

    let state = ractor::call!(root, RootMsg::GetState).unwrap();
    assert_eq!(state, session_core::State::Inactive);
}

#[tokio::test]
async fn call_failure_is_terminal_and_reported() {
    let runtime = Arc::new(TestRuntime::default());
    let root = start(runtime.clone(), params("fail-test")).await;
    settle().await;

    deliver(
        &root,
        SessionMsg::CallFailed {
            reason: "busy".to_string(),
        },
    );
    settle().await;

    let lifecycle = runtime.lifecycle();
    assert!(matches!(
        lifecycle.last(),
        Some(SessionLifecycleEvent::Failed { error, .. }) if error == "busy"
    ));
    assert_eq!(runtime.last_snapshot().unwrap().phase, CallPhase::Failed);
}

#[tokio::test]
async fn transcript_and_suggestion_flow() {
    let runtime = Arc::new(TestRuntime::default());
    let root = start(runtime.clone(), params("flow-test")).await;

    deliver(&root, SessionMsg::CallAnswered);
    deliver(&root, prospect_final("What does onboarding look like?", 1_000));
    deliver(
        &root,
        SessionMsg::Coach(CoachSignal::Suggestion(
            ringside_coach_interface::SuggestionCandidate {
                text: "Walk through the 30-day plan.".to_string(),
                turn_generation: 1,
            },
        )),
    );
    settle().await;

    let snapshot = runtime.last_snapshot().unwrap();
    assert_eq!(snapshot.phase, CallPhase::InProgress);
    assert_eq!(snapshot.transcript.len(), 1);
    assert_eq!(snapshot.transcript[0].text, "What does onboarding look like?");
    assert_eq!(snapshot.transcript[0].sequence, Some(0));
    assert_eq!(
        snapshot.suggestion.as_ref().map(|s| s.text.as_str()),
        Some("Walk through the 30-day plan.")
    );

    deliver(&root, SessionMsg::Hangup);
    settle().await;
    assert!(matches!(
        runtime.lifecycle().last(),
        Some(SessionLifecycleEvent::Ended { .. })
    ));
}

// A candidate arriving mid-prospect-turn stays hidden until the turn ends.
#[tokio::test]
async fn suggestion_waits_for_prospect_to_finish() {
    let runtime = Arc::new(TestRuntime::default());
    let root = start(runtime.clone(), params("pending-test")).await;

    deliver(&root, SessionMsg::CallAnswered);
    deliver(
        &root,
        SessionMsg::Coach(CoachSignal::Speaking {
            speaker: Speaker::Prospect,
            timestamp_ms: 1_000,
        }),
    );
    deliver(
        &root,
        SessionMsg::Coach(CoachSignal::Suggestion(
            ringside_coach_interface::SuggestionCandidate {
                text: "Hold on to this.".to_string(),
                turn_generation: 0,
            },
        )),
    );
    settle().await;

    let snapshot = runtime.last_snapshot().unwrap();
    assert!(snapshot.suggestion.is_none());

    deliver(
        &root,
        SessionMsg::Coach(CoachSignal::Speaking {
            speaker: Speaker::Rep,
            timestamp_ms: 2_000,
        }),
    );
    settle().await;

    let snapshot = runtime.last_snapshot().unwrap();
    assert_eq!(
        snapshot.suggestion.as_ref().map(|s| s.text.as_str()),
        Some("Hold on to this.")
    );
}

#[tokio::test]
async fn recognizer_events_before_answer_are_dropped() {
    let runtime = Arc::new(TestRuntime::default());
    let root = start(runtime.clone(), params("preanswer-test")).await;

    deliver(&root, prospect_final("hello?", 100));
    settle().await;

    let snapshot = runtime.last_snapshot().unwrap();
    assert!(snapshot.transcript.is_empty());
}

// When no candidate arrives in time after a prospect turn, exactly one
// fallback request fires and its result is displayed.
#[tokio::test]
async fn fallback_fires_once_and_displays_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/suggestions/fallback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "Anchor on value before price.",
            "turn_generation": 1,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let runtime = Arc::new(TestRuntime::default());
    let mut p = params("fallback-test");
    p.coach_base_url = server.uri();
    p.coaching.fallback_delay = Duration::from_millis(50);
    let root = start(runtime.clone(), p).await;

    deliver(&root, SessionMsg::CallAnswered);
    deliver(&root, prospect_final("What's the price?", 1_000));

    tokio::time::sleep(Duration::from_millis(400)).await;

    let snapshot = runtime.last_snapshot().unwrap();
    assert_eq!(
        snapshot.suggestion.as_ref().map(|s| s.text.as_str()),
        Some("Anchor on value before price.")
    );

    // wiremock's expect(1) verifies on drop that no second request fired
}

#[tokio::test]
async fn advisory_tags_surface_as_nudges() {
    let runtime = Arc::new(TestRuntime::default());
    let root = start(runtime.clone(), params("nudge-test")).await;

    deliver(&root, SessionMsg::CallAnswered);
    deliver(
        &root,
        SessionMsg::Coach(CoachSignal::Advisory {
            tags: vec![
                "PRICING_DISCUSSED".to_string(),
                "SOMETHING_UNKNOWN".to_string(),
            ],
        }),
    );
    settle().await;

    let snapshot = runtime.last_snapshot().unwrap();
    assert_eq!(snapshot.nudges.len(), 1);
    assert_eq!(snapshot.nudges[0].label, "Pricing discussed");
}
