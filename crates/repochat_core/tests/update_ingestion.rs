use std::sync::Once;

use pretty_assertions::assert_eq;
use repochat_core::{
    update, AppState, Effect, JobState, Msg, SubscriptionId, INVALID_URL_FEEDBACK,
    STARTING_STATUS, STREAM_FAILURE_STATUS, SUCCESS_FEEDBACK,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(repochat_logging::initialize_for_tests);
}

fn submit(state: AppState, url: &str) -> (AppState, SubscriptionId) {
    let (state, effects) = update(
        state,
        Msg::IngestSubmitted {
            url: url.to_string(),
        },
    );
    let subscription = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::OpenProgressStream { subscription, .. } => Some(*subscription),
            _ => None,
        })
        .expect("open stream effect");
    (state, subscription)
}

fn frame(state: AppState, subscription: SubscriptionId, raw: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StreamFrame {
            subscription,
            raw: raw.to_string(),
        },
    )
}

#[test]
fn start_moves_to_connecting_and_opens_stream() {
    init_logging();
    let (mut state, effects) = update(
        AppState::new(),
        Msg::IngestSubmitted {
            url: "  https://github.com/x/y \n".to_string(),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::OpenProgressStream {
            subscription: 1,
            source_url: "https://github.com/x/y".to_string(),
        }]
    );
    let view = state.view();
    assert_eq!(view.ingestion.job.state, JobState::Connecting);
    assert_eq!(view.ingestion.job.progress, 0);
    assert_eq!(view.ingestion.job.status, STARTING_STATUS);
    assert!(view.ingestion.subscription_open);
    assert!(state.consume_dirty());
}

#[test]
fn invalid_url_is_rejected_without_network() {
    init_logging();
    for input in ["", "   \n", "not a url", "github.com/x/y"] {
        let (state, effects) = update(
            AppState::new(),
            Msg::IngestSubmitted {
                url: input.to_string(),
            },
        );
        assert!(effects.is_empty(), "input {input:?} produced effects");
        let view = state.view();
        assert_eq!(view.ingestion.job.state, JobState::Idle);
        assert_eq!(view.ingestion.feedback.as_deref(), Some(INVALID_URL_FEEDBACK));
    }
}

#[test]
fn cloning_then_done_scenario_succeeds_and_refreshes_once() {
    init_logging();
    let (state, id) = submit(AppState::new(), "https://github.com/x/y");

    let (state, effects) = frame(state, id, "data: {\"progress\":10,\"status\":\"cloning\"}");
    assert!(effects.is_empty());
    assert_eq!(state.view().ingestion.job.state, JobState::Running);

    let (state, effects) = frame(state, id, "data: {\"progress\":100,\"status\":\"done\"}");
    assert_eq!(
        effects,
        vec![
            Effect::CloseProgressStream { subscription: id },
            Effect::FetchProjects,
        ]
    );

    let view = state.view();
    assert_eq!(view.ingestion.job.progress, 100);
    assert_eq!(view.ingestion.job.status, "done");
    assert_eq!(view.ingestion.job.state, JobState::Succeeded);
    assert_eq!(view.ingestion.feedback.as_deref(), Some(SUCCESS_FEEDBACK));
    assert!(!view.ingestion.subscription_open);
    assert!(view.directory.loading);

    // The server may keep talking; nothing changes and no second refresh fires.
    let (mut state, effects) = frame(state, id, "data: {\"progress\":100,\"status\":\"again\"}");
    assert!(effects.is_empty());
    assert_eq!(state.view().ingestion.job.status, "done");
    assert!(state.consume_dirty());
    let (mut state, effects) = update(state, Msg::StreamEnded { subscription: id });
    assert!(effects.is_empty());
    assert_eq!(state.view().ingestion.job.state, JobState::Succeeded);
    assert!(!state.consume_dirty());
}

#[test]
fn last_write_wins_independently_per_field() {
    init_logging();
    let (state, id) = submit(AppState::new(), "https://github.com/x/y");
    let frames = [
        "data: {\"progress\":5}",
        "data: {\"status\":\"Starting repository download\"}",
        "data: {\"progress\":12,\"status\":\"Downloading repository completed.\"}",
        "data: {\"progress\":31}",
        "data: {\"status\":\"Building vector database\"}",
        "data: {\"progress\":47}",
    ];
    let state = frames
        .iter()
        .fold(state, |state, raw| frame(state, id, raw).0);

    let job = state.view().ingestion.job;
    assert_eq!(job.progress, 47);
    assert_eq!(job.status, "Building vector database");
    assert_eq!(job.state, JobState::Running);
}

#[test]
fn status_only_frame_keeps_connecting_and_progress() {
    init_logging();
    let (state, id) = submit(AppState::new(), "https://github.com/x/y");
    let (state, _) = frame(state, id, "data: {\"status\":\"queued\"}");

    let job = state.view().ingestion.job;
    assert_eq!(job.state, JobState::Connecting);
    assert_eq!(job.progress, 0);
    assert_eq!(job.status, "queued");
}

#[test]
fn malformed_frames_are_ignored_and_stream_continues() {
    init_logging();
    let (state, id) = submit(AppState::new(), "https://github.com/x/y");
    let (state, _) = frame(state, id, "data: {\"progress\":20}");

    let (mut state, effects) = frame(state, id, "data: {\"progress\": oops");
    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    let (mut state, effects) = frame(state, id, "data: {\"progress\": \"eighty\"}");
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());

    let job = state.view().ingestion.job;
    assert_eq!(job.progress, 20);
    assert_eq!(job.state, JobState::Running);

    let (state, effects) = frame(state, id, "data: {\"progress\":100}");
    assert_eq!(state.view().ingestion.job.state, JobState::Succeeded);
    assert!(effects.contains(&Effect::FetchProjects));
}

#[test]
fn backend_error_frame_keeps_detail_and_stays_open() {
    init_logging();
    let (state, id) = submit(AppState::new(), "https://github.com/x/y");
    let (state, effects) = frame(
        state,
        id,
        "data: {\"progress\":0,\"status\":\"Error\",\"message\":\"repository not found\"}",
    );
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.ingestion.job.status, "Error");
    assert_eq!(
        view.ingestion.job.detail.as_deref(),
        Some("repository not found")
    );
    assert!(view.ingestion.subscription_open);

    // The backend closes the stream right after reporting the error.
    let (state, effects) = update(state, Msg::StreamEnded { subscription: id });
    assert_eq!(effects, vec![Effect::CloseProgressStream { subscription: id }]);
    let job = state.view().ingestion.job;
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.status, STREAM_FAILURE_STATUS);
    assert_eq!(job.detail.as_deref(), Some("repository not found"));
}

#[test]
fn transport_failure_marks_failed_and_closes() {
    init_logging();
    let (state, id) = submit(AppState::new(), "https://github.com/x/y");
    let (state, _) = frame(state, id, "data: {\"progress\":40}");

    let (state, effects) = update(
        state,
        Msg::StreamFailed {
            subscription: id,
            reason: "connection reset".to_string(),
        },
    );
    assert_eq!(effects, vec![Effect::CloseProgressStream { subscription: id }]);
    let job = state.view().ingestion.job;
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.status, STREAM_FAILURE_STATUS);
    assert_eq!(job.progress, 40);

    // No automatic retry, and late frames are dropped.
    let (state, effects) = frame(state, id, "data: {\"progress\":100}");
    assert!(effects.is_empty());
    assert_eq!(state.view().ingestion.job.state, JobState::Failed);
}

#[test]
fn server_closing_early_counts_as_failure() {
    init_logging();
    let (state, id) = submit(AppState::new(), "https://github.com/x/y");
    let (state, effects) = update(state, Msg::StreamEnded { subscription: id });

    assert_eq!(effects, vec![Effect::CloseProgressStream { subscription: id }]);
    let job = state.view().ingestion.job;
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.detail.as_deref(), Some("stream closed before completion"));
}

#[test]
fn cancel_resets_from_any_state_and_is_idempotent() {
    init_logging();
    let (state, id) = submit(AppState::new(), "https://github.com/x/y");
    let (state, _) = frame(state, id, "data: {\"progress\":30}");

    let (mut state, effects) = update(state, Msg::CancelClicked);
    assert_eq!(effects, vec![Effect::CloseProgressStream { subscription: id }]);
    assert_eq!(state.view().ingestion.job.state, JobState::Idle);
    assert!(state.consume_dirty());

    let (mut state, effects) = update(state, Msg::CancelClicked);
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());

    // An event already in flight when cancel ran must not resurrect the job.
    let (state, effects) = frame(state, id, "data: {\"progress\":100,\"status\":\"done\"}");
    assert!(effects.is_empty());
    assert_eq!(state.view().ingestion.job.state, JobState::Idle);
    assert!(!state.view().directory.loading);
}

#[test]
fn cancel_after_success_returns_to_idle() {
    init_logging();
    let (state, id) = submit(AppState::new(), "https://github.com/x/y");
    let (state, _) = frame(state, id, "data: {\"progress\":100}");
    let (state, effects) = update(state, Msg::CancelClicked);

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.ingestion.job.state, JobState::Idle);
    assert_eq!(view.ingestion.feedback, None);
}

#[test]
fn second_submission_replaces_active_subscription() {
    init_logging();
    let (state, first) = submit(AppState::new(), "https://github.com/x/y");
    let (state, _) = frame(state, first, "data: {\"progress\":50}");

    let (state, effects) = update(
        state,
        Msg::IngestSubmitted {
            url: "https://github.com/x/z".to_string(),
        },
    );
    let second = first + 1;
    assert_eq!(
        effects,
        vec![
            Effect::CloseProgressStream {
                subscription: first
            },
            Effect::OpenProgressStream {
                subscription: second,
                source_url: "https://github.com/x/z".to_string(),
            },
        ]
    );

    // Frames from the replaced subscription are ignored.
    let (state, _) = frame(state, first, "data: {\"progress\":100}");
    let job = state.view().ingestion.job;
    assert_eq!(job.source_url, "https://github.com/x/z");
    assert_eq!(job.progress, 0);
    assert_eq!(job.state, JobState::Connecting);

    let (state, _) = frame(state, second, "data: {\"progress\":60}");
    assert_eq!(state.view().ingestion.job.progress, 60);
}

#[test]
fn out_of_range_progress_is_clamped_but_completes() {
    init_logging();
    let (state, id) = submit(AppState::new(), "https://github.com/x/y");
    let (state, effects) = frame(state, id, "data: {\"progress\":140}");

    let job = state.view().ingestion.job;
    assert_eq!(job.progress, 100);
    assert_eq!(job.state, JobState::Succeeded);
    assert!(effects.contains(&Effect::FetchProjects));
}
