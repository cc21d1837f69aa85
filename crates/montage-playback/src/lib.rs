//! Montage Playback - Playback synchronization for the editing core
//!
//! Keeps on-screen playback consistent with the resolved composition:
//! - `Renderer` and `Composer` command surfaces for the external media engine
//! - An actor-style synchronizer task with time-sync and frame-capture loops
//! - Segment pre-render caching, gap handling, and audio post-processing

pub mod composer;
pub mod renderer;
pub mod synchronizer;

pub use composer::{Composer, SegmentKind, SegmentRender, TimelineRender};
pub use renderer::{FrameImage, Renderer};
pub use synchronizer::{
    Command, PlaybackEvent, PlaybackHandle, PlaybackSynchronizer, SegmentCache, SyncState,
};
