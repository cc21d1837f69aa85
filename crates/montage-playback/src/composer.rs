//! Composer command surface.
//!
//! The external compositor classifies multi-track regions and renders them
//! (or whole timelines) to flat files the renderer can play. Long-running
//! renders report percent-complete progress through a channel the
//! synchronizer relays upstream.

use std::future::Future;

use montage_core::{Result, TimelineMs};
use montage_timeline::{ActiveClip, Timeline};

/// Classification of a multi-clip region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// One visible layer; the region can play through the direct path.
    Simple,
    /// Genuine multi-layer composition; must be flattened before playback.
    Complex,
}

/// Result of rendering a region to a flat file.
#[derive(Debug, Clone)]
pub struct SegmentRender {
    /// Path of the rendered file
    pub output_path: String,
}

/// Result of rendering the whole timeline to a flat file.
#[derive(Debug, Clone)]
pub struct TimelineRender {
    /// Path of the rendered file
    pub output_path: String,
    /// Duration of the rendered file in ms
    pub duration_ms: TimelineMs,
}

/// Command surface of the external segment/timeline compositor.
pub trait Composer: Send + Sync {
    /// Classify the active-clip region at a point in time.
    fn classify_segment(
        &self,
        active_clips: &[ActiveClip],
    ) -> impl Future<Output = Result<SegmentKind>> + Send;

    /// Render a multi-track region `[start_time, start_time + duration)` to
    /// a flat file.
    fn render_segment(
        &self,
        active_clips: &[ActiveClip],
        start_time: TimelineMs,
        duration: TimelineMs,
    ) -> impl Future<Output = Result<SegmentRender>> + Send;

    /// Render the entire timeline to a flat file.
    fn render_full_timeline(
        &self,
        timeline: &Timeline,
    ) -> impl Future<Output = Result<TimelineRender>> + Send;
}
