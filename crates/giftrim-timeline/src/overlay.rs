//! Cursor and click overlays from captured input events.
//!
//! Capture code appends [`CursorEvent`]s to an [`EventLog`] while recording.
//! Once frames exist, [`annotate`] draws a cursor highlight at the event
//! nearest each frame's start time and fading rings for recent clicks.

use crate::timeline::{Frame, Timeline};
use giftrim_core::{FrameImage, PixelRect, Point};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which button produced a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickKind {
    Left,
    Right,
}

/// One captured input sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorEvent {
    /// Seconds since the start of capture.
    pub timestamp: f64,
    /// Cursor position in screen coordinates.
    pub position: Point,
    /// Set when the sample is a button press.
    pub click: Option<ClickKind>,
}

/// Append-only event log shared between a capture thread and its reader.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<CursorEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&self, event: CursorEvent) {
        self.events.lock().push(event);
    }

    /// Copy of every event recorded so far, in recording order.
    pub fn snapshot(&self) -> Vec<CursorEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drop all events, e.g. before a new capture.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// Overlay appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayOptions {
    pub show_cursor: bool,
    /// Highlight radius in screen pixels.
    pub highlight_radius: f64,
    pub highlight_color: [u8; 4],
    pub show_clicks: bool,
    /// Click ring radius in screen pixels.
    pub click_radius: f64,
    pub left_click_color: [u8; 4],
    pub right_click_color: [u8; 4],
    /// Seconds over which a click ring fades out.
    pub click_fade: f64,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            show_cursor: true,
            highlight_radius: 18.0,
            highlight_color: [255, 220, 0, 96],
            show_clicks: true,
            click_radius: 14.0,
            left_click_color: [255, 64, 64, 220],
            right_click_color: [64, 128, 255, 220],
            click_fade: 0.5,
        }
    }
}

/// Draw cursor highlights and click rings onto a copy of `timeline`.
///
/// `region` is the captured screen area and `scale` converts screen pixels to
/// image pixels. Frames with nothing to draw keep their original image.
pub fn annotate(
    timeline: &Timeline,
    events: &[CursorEvent],
    region: PixelRect,
    scale: f64,
    options: &OverlayOptions,
) -> Timeline {
    if events.is_empty() || !(scale > 0.0) {
        return timeline.clone();
    }

    let mut sorted = events.to_vec();
    sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    let clicks: Vec<&CursorEvent> = sorted.iter().filter(|e| e.click.is_some()).collect();

    let mut elapsed = 0.0;
    timeline
        .iter()
        .map(|frame| {
            let time = elapsed;
            elapsed += frame.duration;

            let mut canvas: Option<FrameImage> = None;

            if options.show_cursor {
                if let Some(event) = nearest_event(&sorted, time) {
                    if region.contains(event.position) {
                        let image = canvas.get_or_insert_with(|| (*frame.image).clone());
                        let center = to_image_space(event.position, region, scale);
                        fill_circle(
                            image,
                            center,
                            options.highlight_radius * scale,
                            options.highlight_color,
                            1.0,
                        );
                    }
                }
            }

            if options.show_clicks && options.click_fade > 0.0 {
                for click in &clicks {
                    let age = time - click.timestamp;
                    if !(0.0..=options.click_fade).contains(&age) || !region.contains(click.position)
                    {
                        continue;
                    }
                    let fade = 1.0 - age / options.click_fade;
                    let color = match click.click {
                        Some(ClickKind::Right) => options.right_click_color,
                        _ => options.left_click_color,
                    };
                    let image = canvas.get_or_insert_with(|| (*frame.image).clone());
                    let center = to_image_space(click.position, region, scale);
                    // Ring grows as it fades
                    let radius = options.click_radius * scale * (1.0 + 0.5 * (1.0 - fade));
                    stroke_circle(image, center, radius, (2.0 * scale).max(1.0), color, fade);
                }
            }

            match canvas {
                Some(image) => Frame::from_shared(Arc::new(image), frame.duration),
                None => frame.clone(),
            }
        })
        .collect()
}

/// Event whose timestamp is closest to `time`. `events` must be sorted.
fn nearest_event(events: &[CursorEvent], time: f64) -> Option<&CursorEvent> {
    let idx = events.partition_point(|e| e.timestamp < time);
    let after = events.get(idx);
    let before = idx.checked_sub(1).and_then(|i| events.get(i));
    match (before, after) {
        (Some(b), Some(a)) => {
            if time - b.timestamp <= a.timestamp - time {
                Some(b)
            } else {
                Some(a)
            }
        }
        (b, a) => b.or(a),
    }
}

fn to_image_space(position: Point, region: PixelRect, scale: f64) -> Point {
    Point::new(
        (position.x - region.x as f64) * scale,
        (position.y - region.y as f64) * scale,
    )
}

/// Source-over blend of `color` at `opacity` onto one pixel.
fn blend_pixel(image: &mut FrameImage, x: u32, y: u32, color: [u8; 4], opacity: f64) {
    let Some(dst) = image.pixel(x, y) else {
        return;
    };
    let alpha = (color[3] as f64 / 255.0) * opacity.clamp(0.0, 1.0);
    let mut out = dst;
    for c in 0..3 {
        out[c] = (color[c] as f64 * alpha + dst[c] as f64 * (1.0 - alpha)).round() as u8;
    }
    out[3] = dst[3].max((alpha * 255.0).round() as u8);
    image.set_pixel(x, y, out);
}

/// Visit every pixel whose center lies within `outer` of `center` but not within `inner`.
fn for_each_in_annulus(
    image: &mut FrameImage,
    center: Point,
    inner: f64,
    outer: f64,
    mut visit: impl FnMut(&mut FrameImage, u32, u32),
) {
    if outer <= 0.0 {
        return;
    }
    let min_x = (center.x - outer).floor().max(0.0) as u32;
    let min_y = (center.y - outer).floor().max(0.0) as u32;
    let max_x = ((center.x + outer).ceil().max(0.0) as u32).min(image.width);
    let max_y = ((center.y + outer).ceil().max(0.0) as u32).min(image.height);

    for y in min_y..max_y {
        for x in min_x..max_x {
            let d = Point::new(x as f64 + 0.5, y as f64 + 0.5).distance(center);
            if d <= outer && d >= inner {
                visit(image, x, y);
            }
        }
    }
}

fn fill_circle(image: &mut FrameImage, center: Point, radius: f64, color: [u8; 4], opacity: f64) {
    for_each_in_annulus(image, center, 0.0, radius, |img, x, y| {
        blend_pixel(img, x, y, color, opacity)
    });
}

fn stroke_circle(
    image: &mut FrameImage,
    center: Point,
    radius: f64,
    thickness: f64,
    color: [u8; 4],
    opacity: f64,
) {
    let inner = (radius - thickness / 2.0).max(0.0);
    let outer = radius + thickness / 2.0;
    for_each_in_annulus(image, center, inner, outer, |img, x, y| {
        blend_pixel(img, x, y, color, opacity)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_timeline(count: usize, duration: f64) -> Timeline {
        (0..count)
            .map(|_| Frame::new(FrameImage::solid(40, 40, [0, 0, 0]), duration))
            .collect()
    }

    fn move_event(t: f64, x: f64, y: f64) -> CursorEvent {
        CursorEvent {
            timestamp: t,
            position: Point::new(x, y),
            click: None,
        }
    }

    #[test]
    fn test_event_log_snapshot() {
        let log = EventLog::new();
        log.record(move_event(0.0, 1.0, 1.0));
        let snapshot = log.snapshot();
        log.record(move_event(0.1, 2.0, 2.0));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_event_log_is_shareable() {
        let log = std::sync::Arc::new(EventLog::new());
        let writer = {
            let log = log.clone();
            std::thread::spawn(move || {
                for i in 0..100 {
                    log.record(move_event(i as f64 * 0.01, 0.0, 0.0));
                }
            })
        };
        writer.join().unwrap();
        assert_eq!(log.snapshot().len(), 100);
    }

    #[test]
    fn test_nearest_event() {
        let events = vec![
            move_event(0.0, 0.0, 0.0),
            move_event(1.0, 1.0, 0.0),
            move_event(2.0, 2.0, 0.0),
        ];
        assert_eq!(nearest_event(&events, 0.4).unwrap().timestamp, 0.0);
        assert_eq!(nearest_event(&events, 0.6).unwrap().timestamp, 1.0);
        assert_eq!(nearest_event(&events, 9.0).unwrap().timestamp, 2.0);
        assert!(nearest_event(&[], 1.0).is_none());
    }

    #[test]
    fn test_highlight_drawn_at_cursor() {
        let tl = black_timeline(2, 0.5);
        let region = PixelRect::new(100, 100, 40, 40);
        let events = vec![move_event(0.0, 110.0, 110.0), move_event(0.5, 130.0, 130.0)];
        let options = OverlayOptions {
            show_clicks: false,
            highlight_radius: 3.0,
            highlight_color: [255, 0, 0, 255],
            ..Default::default()
        };

        let out = annotate(&tl, &events, region, 1.0, &options);
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(0).unwrap().image.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(out.get(0).unwrap().image.pixel(30, 30), Some([0, 0, 0, 255]));
        assert_eq!(out.get(1).unwrap().image.pixel(30, 30), Some([255, 0, 0, 255]));
        // Input is untouched
        assert_eq!(tl.get(0).unwrap().image.pixel(10, 10), Some([0, 0, 0, 255]));
        assert_eq!(out.total_duration(), tl.total_duration());
    }

    #[test]
    fn test_cursor_outside_region_leaves_frame() {
        let tl = black_timeline(1, 0.5);
        let events = vec![move_event(0.0, 500.0, 500.0)];
        let out = annotate(&tl, &events, PixelRect::new(0, 0, 40, 40), 1.0, &OverlayOptions::default());
        assert!(Arc::ptr_eq(&out.get(0).unwrap().image, &tl.get(0).unwrap().image));
    }

    #[test]
    fn test_click_ring_fades() {
        let tl = black_timeline(3, 0.25);
        let events = vec![CursorEvent {
            timestamp: 0.0,
            position: Point::new(20.0, 20.0),
            click: Some(ClickKind::Left),
        }];
        let options = OverlayOptions {
            show_cursor: false,
            click_radius: 8.0,
            click_fade: 0.5,
            left_click_color: [255, 255, 255, 255],
            ..Default::default()
        };
        let out = annotate(&tl, &events, PixelRect::new(0, 0, 40, 40), 1.0, &options);

        let brightest = |i: usize| {
            out.get(i)
                .unwrap()
                .image
                .data
                .chunks_exact(4)
                .map(|px| px[0])
                .max()
                .unwrap()
        };
        // t = 0.0 full, t = 0.25 half faded, t = 0.5 gone
        assert_eq!(brightest(0), 255);
        assert!(brightest(1) > 0 && brightest(1) < 255);
        assert_eq!(brightest(2), 0);
    }

    #[test]
    fn test_scale_maps_into_image() {
        let tl = black_timeline(1, 0.5);
        let events = vec![move_event(0.0, 10.0, 10.0)];
        let options = OverlayOptions {
            highlight_radius: 1.0,
            highlight_color: [0, 255, 0, 255],
            show_clicks: false,
            ..Default::default()
        };
        let out = annotate(&tl, &events, PixelRect::new(0, 0, 20, 20), 2.0, &options);
        assert_eq!(out.get(0).unwrap().image.pixel(20, 20), Some([0, 255, 0, 255]));
    }
}
