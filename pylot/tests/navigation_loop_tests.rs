mod common;

use common::{config, config_with, word, Action, RecordingInput, RecordingSink, ScriptedRecognizer, Step};
use pylot::{
    CancellationToken, Navigator, Pacing, PilotError, Point, Resolution, RunStats, Transition,
};
use std::time::{Duration, Instant};

fn navigator(
    recognizer: &ScriptedRecognizer,
    input: &RecordingInput,
    sink: &RecordingSink,
) -> Navigator {
    common::init_tracing();
    Navigator::new(
        config(),
        Box::new(recognizer.clone()),
        Box::new(input.clone()),
        Box::new(sink.clone()),
    )
    .unwrap()
}

fn matched(name: &str, index: usize) -> Resolution {
    Resolution::Matched {
        name: name.to_string(),
        index,
        confidence: 1.0,
    }
}

#[tokio::test]
async fn test_explore_clicks_gate_to_next_system() {
    let recognizer = ScriptedRecognizer::new(
        ["Kaunokka"],
        vec![word("Otela", 10, 40), word("Kino", 100, 100)],
    );
    let input = RecordingInput::default();
    let sink = RecordingSink::default();
    let nav = navigator(&recognizer, &input, &sink);

    let exploration = nav.explore().await.unwrap();

    assert_eq!(exploration.position.index(), Some(5));
    assert_eq!(exploration.desired_index, 6);
    assert!(!exploration.fell_back);
    assert_eq!(exploration.target.resolution.name(), Some("Kino"));
    // Overview region origin (1500, 200) plus the gate's box corner.
    assert_eq!(exploration.target_point, Point::new(1600, 300));

    let gate = Point::new(1600, 300);
    let jump = Point::new(1700, 120);
    assert_eq!(
        input.actions(),
        vec![
            Action::Move(gate),
            Action::Click(gate),
            Action::Move(jump),
            Action::Click(jump),
        ]
    );

    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].system.name(), Some("Kaunokka"));
    assert_eq!(reports[0].probe_contacts, vec!["Sleeper Drone", "Wreck"]);
    assert_eq!(reports[0].dscan_contacts, vec!["Tengu"]);
    assert_eq!(reports[0].auth_key, "k3y");
}

#[tokio::test]
async fn test_explore_falls_back_to_first_gate() {
    let recognizer = ScriptedRecognizer::new(
        ["Kaunokka"],
        vec![word("Otela", 10, 40), word("Ala", 10, 80)],
    );
    let input = RecordingInput::default();
    let sink = RecordingSink::default();
    let nav = navigator(&recognizer, &input, &sink);

    let exploration = nav.explore().await.unwrap();

    assert!(exploration.fell_back);
    assert_eq!(exploration.target.resolution.name(), Some("Otela"));
    assert_eq!(input.clicks(), vec![Point::new(1510, 240), Point::new(1700, 120)]);
}

#[tokio::test]
async fn test_unresolved_position_heads_to_route_start() {
    let recognizer = ScriptedRecognizer::new(
        [""],
        vec![word("Kino", 10, 40), word("Ala", 10, 80)],
    );
    let input = RecordingInput::default();
    let sink = RecordingSink::default();
    let nav = navigator(&recognizer, &input, &sink);

    let exploration = nav.explore().await.unwrap();

    assert_eq!(exploration.position, Resolution::Unmatched);
    assert_eq!(exploration.desired_index, 0);
    assert_eq!(exploration.target.resolution.name(), Some("Ala"));
    assert_eq!(sink.reports()[0].system, Resolution::Unmatched);
}

#[tokio::test]
async fn test_empty_overview_reports_but_does_not_click() {
    let recognizer = ScriptedRecognizer::new(["Kaunokka"], vec![]);
    let input = RecordingInput::default();
    let sink = RecordingSink::default();
    let nav = navigator(&recognizer, &input, &sink);

    let err = nav.explore().await.unwrap_err();

    assert!(matches!(err, PilotError::NoCandidates));
    assert!(err.is_transient());
    assert_eq!(sink.reports().len(), 1);
    assert!(input.actions().is_empty());
}

#[tokio::test]
async fn test_report_failure_does_not_block_navigation() {
    let recognizer = ScriptedRecognizer::new(["Kaunokka"], vec![word("Kino", 100, 100)]);
    let input = RecordingInput::default();
    let sink = RecordingSink::failing();
    let nav = navigator(&recognizer, &input, &sink);

    nav.explore().await.unwrap();

    assert_eq!(sink.reports().len(), 1);
    assert_eq!(input.clicks().len(), 2);
}

#[tokio::test]
async fn test_await_transition_exits_on_change() {
    let recognizer = ScriptedRecognizer::new(["Kaunokka", "Kaunokka", "Kino"], vec![]);
    let nav = navigator(&recognizer, &RecordingInput::default(), &RecordingSink::default());

    let transition = nav.await_transition(&matched("Kaunokka", 5)).await.unwrap();

    assert_eq!(transition, Transition::Arrived(matched("Kino", 6)));
    assert_eq!(recognizer.position_reads(), 3);
}

#[tokio::test]
async fn test_await_transition_ignores_unreadable_position() {
    // Mid-jump the position region is blank.
    let recognizer = ScriptedRecognizer::new(["", "", "Kino"], vec![]);
    let nav = navigator(&recognizer, &RecordingInput::default(), &RecordingSink::default());

    let transition = nav.await_transition(&matched("Kaunokka", 5)).await.unwrap();

    assert_eq!(transition, Transition::Arrived(matched("Kino", 6)));
    assert_eq!(recognizer.position_reads(), 3);
}

#[tokio::test]
async fn test_await_transition_from_unknown_position() {
    let recognizer = ScriptedRecognizer::new(["", "Ala"], vec![]);
    let nav = navigator(&recognizer, &RecordingInput::default(), &RecordingSink::default());

    let transition = nav.await_transition(&Resolution::Unmatched).await.unwrap();

    assert_eq!(transition, Transition::Arrived(matched("Ala", 0)));
}

#[tokio::test]
async fn test_await_transition_gives_up_after_bound() {
    let recognizer = ScriptedRecognizer::new(["Kaunokka"], vec![]);
    let pacing = Pacing {
        await_attempts: 5,
        ..Pacing::immediate()
    };
    let nav = Navigator::new(
        config_with(pacing),
        Box::new(recognizer.clone()),
        Box::new(RecordingInput::default()),
        Box::new(RecordingSink::default()),
    )
    .unwrap();

    let transition = nav.await_transition(&matched("Kaunokka", 5)).await.unwrap();

    assert_eq!(transition, Transition::GaveUp);
    assert_eq!(recognizer.position_reads(), 5);
}

#[tokio::test]
async fn test_give_up_does_not_wait_after_last_attempt() {
    let recognizer = ScriptedRecognizer::new(["Kaunokka"], vec![]);
    let pacing = Pacing {
        await_attempts: 2,
        poll_interval: Duration::from_millis(400),
        ..Pacing::immediate()
    };
    let nav = Navigator::new(
        config_with(pacing),
        Box::new(recognizer.clone()),
        Box::new(RecordingInput::default()),
        Box::new(RecordingSink::default()),
    )
    .unwrap();

    let started = Instant::now();
    let transition = nav.await_transition(&matched("Kaunokka", 5)).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(transition, Transition::GaveUp);
    assert_eq!(recognizer.position_reads(), 2);
    // One interval between the two polls, none after the second.
    assert!(elapsed >= Duration::from_millis(400), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(750), "{elapsed:?}");
}

#[tokio::test]
async fn test_run_recovers_from_recognition_failure() {
    let cancel = CancellationToken::new();
    let recognizer = ScriptedRecognizer::new(
        [Step::Fail, "Kaunokka".into(), "Kino".into()],
        vec![word("Kino", 100, 100)],
    );
    let input = RecordingInput::default();
    let sink = RecordingSink::cancelling_after(1, cancel.clone());
    let nav = navigator(&recognizer, &input, &sink);

    let stats = nav.run(cancel).await.unwrap();

    assert_eq!(
        stats,
        RunStats {
            cycles: 1,
            arrivals: 1,
            failures: 1,
        }
    );
    // The failed attempt never got as far as reporting.
    assert_eq!(sink.reports().len(), 1);
    assert_eq!(input.clicks(), vec![Point::new(1600, 300), Point::new(1700, 120)]);
}

#[tokio::test]
async fn test_run_follows_the_route() {
    let cancel = CancellationToken::new();
    let recognizer = ScriptedRecognizer::new(
        ["Kaunokka", "Kino", "Kino", "Konola", "Konola", "Krirald"],
        vec![
            word("Krirald", 10, 20),
            word("Konola", 10, 50),
            word("Kino", 10, 80),
        ],
    );
    let input = RecordingInput::default();
    let sink = RecordingSink::cancelling_after(3, cancel.clone());
    let nav = navigator(&recognizer, &input, &sink);

    let stats = nav.run(cancel).await.unwrap();

    assert_eq!(stats.cycles, 3);
    assert_eq!(stats.arrivals, 3);
    assert_eq!(stats.failures, 0);

    let visited: Vec<_> = sink
        .reports()
        .iter()
        .map(|report| report.system.name().unwrap().to_string())
        .collect();
    assert_eq!(visited, vec!["Kaunokka", "Kino", "Konola"]);

    let gates: Vec<Point> = input
        .clicks()
        .into_iter()
        .filter(|point| *point != Point::new(1700, 120))
        .collect();
    assert_eq!(
        gates,
        vec![Point::new(1510, 280), Point::new(1510, 250), Point::new(1510, 220)]
    );
}

#[tokio::test]
async fn test_run_does_not_start_when_cancelled() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let recognizer = ScriptedRecognizer::new(["Kaunokka"], vec![word("Kino", 100, 100)]);
    let input = RecordingInput::default();
    let sink = RecordingSink::default();
    let nav = navigator(&recognizer, &input, &sink);

    let stats = nav.run(cancel).await.unwrap();

    assert_eq!(stats, RunStats::default());
    assert_eq!(recognizer.position_reads(), 0);
    assert!(sink.reports().is_empty());
}

#[tokio::test]
async fn test_run_stops_on_configuration_error() {
    let recognizer = ScriptedRecognizer::new([Step::Fail, Step::Fatal], vec![]);
    let nav = navigator(&recognizer, &RecordingInput::default(), &RecordingSink::default());

    let err = nav.run(CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, PilotError::Config(_)));
    assert_eq!(recognizer.position_reads(), 2);
}
