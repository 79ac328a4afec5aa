//! Capture overlay scenarios: concurrent event logging, annotation, then
//! geometric edits over the annotated frames.

use giftrim_core::{FrameImage, HistorySettings, PixelRect, Point};
use giftrim_timeline::{
    annotate, ClickKind, Command, CursorEvent, EditSession, EventLog, Frame, OverlayOptions,
    Timeline, TimelineOp,
};
use std::sync::Arc;

fn black_frames(count: usize) -> Timeline {
    (0..count)
        .map(|_| Frame::new(FrameImage::solid(100, 100, [0, 0, 0]), 0.25))
        .collect()
}

#[test]
fn concurrent_event_log_feeds_annotation() {
    let log = Arc::new(EventLog::new());

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let log = Arc::clone(&log);
            scope.spawn(move || {
                for i in 0..10 {
                    let timestamp = (worker * 10 + i) as f64 * 0.025;
                    log.record(CursorEvent {
                        timestamp,
                        position: Point::new(50.0, 50.0),
                        click: (i == 0).then_some(ClickKind::Left),
                    });
                }
            });
        }
    });
    assert_eq!(log.len(), 40);

    let frames = black_frames(4);
    let annotated = annotate(
        &frames,
        &log.snapshot(),
        PixelRect::new(0, 0, 100, 100),
        1.0,
        &OverlayOptions::default(),
    );

    assert_eq!(annotated.len(), frames.len());
    assert!((annotated.total_duration() - frames.total_duration()).abs() < 1e-12);
    assert!(annotated
        .iter()
        .all(|f| f.image.pixel(50, 50) != Some([0, 0, 0, 255])));
    // Source frames are untouched
    assert_eq!(frames.get(0).unwrap().image.pixel(50, 50), Some([0, 0, 0, 255]));
}

#[test]
fn crop_and_resize_annotated_frames_with_undo() {
    let events = [CursorEvent {
        timestamp: 0.0,
        position: Point::new(20.0, 20.0),
        click: None,
    }];
    let annotated = annotate(
        &black_frames(3),
        &events,
        PixelRect::new(0, 0, 100, 100),
        1.0,
        &OverlayOptions::default(),
    );

    let mut session = EditSession::new(annotated.clone(), &HistorySettings::default());
    session.execute(Command::transform(TimelineOp::Crop {
        rect: PixelRect::new(10, 10, 50, 50),
    }));
    assert_eq!(session.timeline().dimensions(), Some((50, 50)));

    session.execute(Command::transform(TimelineOp::Resize { max_width: 25 }));
    assert_eq!(session.timeline().dimensions(), Some((25, 25)));

    session.undo().unwrap();
    session.undo().unwrap();
    assert_eq!(session.timeline(), &annotated);
}
