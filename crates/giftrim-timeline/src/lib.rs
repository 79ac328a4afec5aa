//! GifTrim Timeline - Frame timeline editing
//!
//! Implements the animated-image timeline and everything that edits it:
//! - Ordered (image, duration) frames
//! - Frame operations: trim, reorder, retime, crop, resize
//! - Duration-preserving frame reduction and size-targeted optimization
//! - Memory-bounded undo/redo over reversible commands
//! - Cursor/click overlays from captured input events

pub mod edit;
pub mod ops;
pub mod optimize;
pub mod overlay;
pub mod session;
pub mod similarity;
pub mod timeline;

pub use edit::{Command, CommandStack, HistoryError, HistoryState, TimelineOp};
pub use optimize::{aggressive_optimize, estimate_size, OptimizeReport};
pub use overlay::{annotate, ClickKind, CursorEvent, EventLog, OverlayOptions};
pub use session::EditSession;
pub use timeline::{clamp_duration, Frame, Timeline};
