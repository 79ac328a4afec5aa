//! Import → edit → encode scenarios.
//!
//! Exercises giftrim-media's ingest pipeline feeding giftrim-timeline's
//! session and handing the result to an encoder.

use giftrim_core::EditorSettings;
use giftrim_media::{
    encode_timeline, AnimationEncoder, CancelToken, EncodeError, EncodeOptions, IngestPipeline,
    IngestStage, PatternSource,
};
use giftrim_timeline::{Command, EditSession, Timeline, TimelineOp};
use std::sync::Arc;

// ── Helpers ────────────────────────────────────────────────────

/// Writes a textual summary instead of image bytes.
struct SummaryEncoder;

impl AnimationEncoder for SummaryEncoder {
    fn format(&self) -> &str {
        "summary"
    }

    fn encode(&self, timeline: &Timeline, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
        let (w, h) = timeline.dimensions().unwrap_or((0, 0));
        Ok(format!("{w}x{h}:{}:{}", timeline.len(), options.loop_count).into_bytes())
    }
}

async fn import(seconds: f64) -> Timeline {
    IngestPipeline::default()
        .run(
            Arc::new(PatternSource::new(seconds, 30.0, (160, 120))),
            &CancelToken::new(),
            |_| {},
        )
        .await
        .unwrap()
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

// ── Scenarios ──────────────────────────────────────────────────

#[tokio::test]
async fn import_edit_undo_redo_encode() {
    let timeline = import(2.05).await;
    assert_eq!(timeline.len(), 31);
    let original = timeline.clone();

    let mut session = EditSession::new(timeline, &EditorSettings::default().history);
    session.execute(Command::delete_range(0..10));
    session.execute(Command::transform(TimelineOp::Yoyo));
    let state = session.execute(Command::transform(TimelineOp::AdjustSpeed { multiplier: 2.0 }));

    assert_eq!(session.timeline().len(), 41);
    assert_close(session.timeline().total_duration(), 41.0 / 15.0 / 2.0);
    assert_eq!(state.undo_count, 3);
    assert_eq!(state.undo_label.as_deref(), Some("Change Speed ×2.00"));

    for _ in 0..3 {
        session.undo().unwrap();
    }
    assert_eq!(session.timeline(), &original);
    assert!(!session.history().can_undo);

    for _ in 0..3 {
        session.redo().unwrap();
    }
    assert_eq!(session.timeline().len(), 41);

    let options = EncodeOptions {
        max_width: Some(80),
        ..Default::default()
    };
    let bytes = encode_timeline(&SummaryEncoder, session.timeline(), &options).unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), "80x60:41:0");
}

#[tokio::test]
async fn optimize_after_import_preserves_duration() {
    let timeline = import(2.05).await;
    let total = timeline.total_duration();

    let mut session = EditSession::new(timeline, &EditorSettings::default().history);
    session.execute(Command::transform(TimelineOp::AggressiveOptimize {
        target_size_kb: 1,
        settings: Default::default(),
    }));

    assert!(session.timeline().len() < 31);
    assert_close(session.timeline().total_duration(), total);

    session.undo().unwrap();
    assert_eq!(session.timeline().len(), 31);
}

#[tokio::test]
async fn settings_file_drives_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("giftrim").join("settings.json");

    let mut settings = EditorSettings::default();
    settings.ingest.max_frames = 5;
    settings.save(&path).unwrap();

    let loaded = EditorSettings::load(&path).unwrap();
    let timeline = IngestPipeline::new(loaded.ingest)
        .run(
            Arc::new(PatternSource::new(10.0, 30.0, (64, 48))),
            &CancelToken::new(),
            |_| {},
        )
        .await
        .unwrap();
    assert_eq!(timeline.len(), 5);
}

#[tokio::test]
async fn cancelled_import_reports_cancelled() {
    let cancel = CancelToken::new();
    cancel.cancel();

    let mut stages = Vec::new();
    let result = IngestPipeline::default()
        .run(
            Arc::new(PatternSource::new(1.0, 30.0, (64, 48))),
            &cancel,
            |p| stages.push(p.stage),
        )
        .await;

    let err = result.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.status_message(), "Import cancelled");
    assert_eq!(stages.last(), Some(&IngestStage::Cancelled));
}

#[test]
fn encoding_empty_session_fails() {
    let session = EditSession::default();
    let err = encode_timeline(&SummaryEncoder, session.timeline(), &EncodeOptions::default());
    assert!(matches!(err, Err(EncodeError::EmptyTimeline)));
}
