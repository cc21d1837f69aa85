//! Clip types for the timeline.

use montage_core::{TimeSpan, TimelineMs};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum visible span a trim operation may leave, in milliseconds.
///
/// Enforced by the trim operations upstream of this crate; the layout store
/// assumes every clip it holds satisfies it.
pub const MIN_VISIBLE_SPAN_MS: TimelineMs = 100;

/// Payload for inserting a new clip into a track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipSpec {
    /// Path to the media file
    pub file_path: String,
    /// Timeline position in ms
    pub start_time: TimelineMs,
    /// Full source length in ms
    pub duration: TimelineMs,
    /// Source in point in ms
    pub trim_in: TimelineMs,
    /// Source out point in ms
    pub trim_out: TimelineMs,
    /// Playback volume, 0.0-2.0
    pub volume: Option<f64>,
    /// Mute flag
    pub muted: Option<bool>,
    /// Linear fade-in length in ms
    pub fade_in: Option<TimelineMs>,
    /// Linear fade-out length in ms
    pub fade_out: Option<TimelineMs>,
}

impl ClipSpec {
    /// Spec for an untrimmed clip spanning its full source length.
    pub fn full(file_path: impl Into<String>, start_time: TimelineMs, duration: TimelineMs) -> Self {
        Self {
            file_path: file_path.into(),
            start_time,
            duration,
            trim_in: 0,
            trim_out: duration,
            volume: None,
            muted: None,
            fade_in: None,
            fade_out: None,
        }
    }
}

/// A clip on the timeline: a media file reference with a trim window.
///
/// The visible portion of the source is `[trim_in, trim_out)`; on the
/// timeline the clip occupies `[start_time, start_time + visible_duration)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: Uuid,
    /// Path to the media file
    pub file_path: String,
    /// Timeline position in ms
    pub start_time: TimelineMs,
    /// Full source length in ms
    pub duration: TimelineMs,
    /// Source in point in ms
    pub trim_in: TimelineMs,
    /// Source out point in ms (`trim_out > trim_in`)
    pub trim_out: TimelineMs,
    /// Playback volume, 0.0-2.0. `None` plays at 1.0.
    pub volume: Option<f64>,
    /// Mute flag. `None` plays unmuted.
    pub muted: Option<bool>,
    /// Linear fade-in length in ms
    pub fade_in: Option<TimelineMs>,
    /// Linear fade-out length in ms
    pub fade_out: Option<TimelineMs>,
}

impl Clip {
    /// Create a new clip from an insertion spec, generating its ID.
    pub fn from_spec(spec: ClipSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_path: spec.file_path,
            start_time: spec.start_time.max(0),
            duration: spec.duration,
            trim_in: spec.trim_in,
            trim_out: spec.trim_out,
            volume: spec.volume,
            muted: spec.muted,
            fade_in: spec.fade_in,
            fade_out: spec.fade_out,
        }
    }

    /// Length of the visible portion on the timeline.
    #[inline]
    pub fn visible_duration(&self) -> TimelineMs {
        self.trim_out - self.trim_in
    }

    /// Timeline end (exclusive).
    #[inline]
    pub fn end_time(&self) -> TimelineMs {
        self.start_time + self.visible_duration()
    }

    /// The timeline span this clip occupies.
    #[inline]
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start_time, self.visible_duration())
    }

    /// Whether the clip is active at `time`: inclusive start, exclusive end.
    #[inline]
    pub fn is_active_at(&self, time: TimelineMs) -> bool {
        self.span().contains(time)
    }

    /// Playback volume with the 1.0 default applied.
    #[inline]
    pub fn effective_volume(&self) -> f64 {
        self.volume.unwrap_or(1.0)
    }

    /// Mute state with the unmuted default applied.
    #[inline]
    pub fn is_muted(&self) -> bool {
        self.muted.unwrap_or(false)
    }

    /// Whether the configured fades fit inside the visible span.
    ///
    /// Fade filters must not be applied when the combined fade length
    /// exceeds the clip's visible duration.
    pub fn fades_fit(&self) -> bool {
        self.fade_in.unwrap_or(0) + self.fade_out.unwrap_or(0) <= self.visible_duration()
    }
}
