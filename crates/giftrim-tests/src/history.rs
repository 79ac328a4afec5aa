//! Undo history under memory pressure with real frame data.

use giftrim_core::{FrameImage, HistorySettings};
use giftrim_timeline::{Command, CommandStack, EditSession, Frame, HistoryError, Timeline, TimelineOp};

fn timeline(count: usize) -> Timeline {
    (0..count)
        .map(|i| Frame::new(FrameImage::solid(16, 16, [(i * 20) as u8, 0, 0]), 0.1))
        .collect()
}

#[test]
fn ceiling_evicts_oldest_snapshots() {
    let mut tl = timeline(10);
    let ceiling = tl.memory_size() * 3;
    let mut stack = CommandStack::new(50, ceiling);

    for _ in 0..5 {
        let state = stack.execute(
            &mut tl,
            Command::transform(TimelineOp::AdjustSpeed { multiplier: 2.0 }),
        );
        assert!(state.memory_usage <= ceiling);
    }
    assert_eq!(stack.undo_count(), 2);

    stack.undo(&mut tl).unwrap();
    stack.undo(&mut tl).unwrap();
    assert_eq!(stack.undo(&mut tl), Err(HistoryError::NothingToUndo));

    // Three speed-ups were evicted and cannot be undone
    assert!(tl.iter().all(|f| (f.duration - 0.1 / 8.0).abs() < 1e-12));
}

#[test]
fn count_limit_from_settings() {
    let settings = HistorySettings {
        max_commands: 3,
        ..Default::default()
    };
    let mut session = EditSession::new(timeline(8), &settings);
    for _ in 0..6 {
        session.execute(Command::duplicate_frame(0));
    }
    let state = session.history();
    assert_eq!(state.undo_count, 3);
    assert_eq!(session.timeline().len(), 14);

    while session.undo().is_ok() {}
    assert_eq!(session.timeline().len(), 11);
}

#[test]
fn new_edit_discards_redo_branch() {
    let mut session = EditSession::new(timeline(6), &HistorySettings::default());
    session.execute(Command::transform(TimelineOp::RemoveEven));
    session.undo().unwrap();
    assert!(session.history().can_redo);

    let state = session.execute(Command::delete_frame(0));
    assert!(!state.can_redo);
    assert_eq!(session.redo(), Err(HistoryError::NothingToRedo));
    assert_eq!(session.timeline().len(), 5);
}
