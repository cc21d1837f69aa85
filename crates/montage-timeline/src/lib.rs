//! Montage Timeline - Timeline composition data model
//!
//! Implements the mutable clip layout for the editing core:
//! - Tracks and clips positioned on a shared millisecond timeline
//! - Layout mutations (move, split, cross-track relocate) with collision
//!   avoidance and bounded snapshot undo
//! - Pure composition-resolver queries (active clips, gaps, boundaries)
//! - Versioned layout persistence

pub mod clip;
pub mod layout;
pub mod resolver;
pub mod serialization;
pub mod track;

pub use clip::{Clip, ClipSpec, MIN_VISIBLE_SPAN_MS};
pub use layout::{ClipLayoutStore, Timeline, HISTORY_DEPTH};
pub use resolver::ActiveClip;
pub use serialization::LayoutFile;
pub use track::{Track, TrackKind};
