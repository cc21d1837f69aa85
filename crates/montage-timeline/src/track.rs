//! Track types for the timeline.

use montage_core::{TimeSpan, TimelineMs};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clip::Clip;

/// Kind of track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
}

/// A track: an ordered lane of clips on the shared timeline.
///
/// Clips are kept sorted by `start_time`. Overlap between clips on the same
/// track is permitted by the data model; only the move operations steer
/// around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: Uuid,
    /// 1-based display/z-order number within the track's kind
    pub number: u32,
    /// Track kind
    pub kind: TrackKind,
    /// Clips ordered by start time
    pub clips: Vec<Clip>,
}

impl Track {
    /// Create a new track of the given kind.
    pub fn new(kind: TrackKind, number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            number,
            kind,
            clips: Vec::new(),
        }
    }

    /// Create a new video track.
    pub fn new_video(number: u32) -> Self {
        Self::new(TrackKind::Video, number)
    }

    /// Create a new audio track.
    pub fn new_audio(number: u32) -> Self {
        Self::new(TrackKind::Audio, number)
    }

    /// Insert a clip, keeping the sequence ordered by start time.
    pub fn insert_sorted(&mut self, clip: Clip) {
        let at = self
            .clips
            .partition_point(|c| c.start_time <= clip.start_time);
        self.clips.insert(at, clip);
    }

    /// Re-sort clips after a start time changed in place.
    pub fn sort_clips(&mut self) {
        self.clips.sort_by_key(|c| c.start_time);
    }

    /// Find a clip by ID.
    pub fn find_clip(&self, id: Uuid) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    /// Find a clip mutably by ID.
    pub fn find_clip_mut(&mut self, id: Uuid) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == id)
    }

    /// Remove a clip by ID. Returns the removed clip.
    pub fn remove_clip(&mut self, id: Uuid) -> Option<Clip> {
        let index = self.clips.iter().position(|c| c.id == id)?;
        Some(self.clips.remove(index))
    }

    /// Timeline end of this track: the latest clip end, 0 when empty.
    pub fn end_time(&self) -> TimelineMs {
        self.clips.iter().map(Clip::end_time).max().unwrap_or(0)
    }

    /// Whether any clip on this track overlaps `span`, excluding `exclude`.
    pub fn has_overlap(&self, span: TimeSpan, exclude: Option<Uuid>) -> bool {
        self.clips
            .iter()
            .filter(|c| Some(c.id) != exclude)
            .any(|c| c.span().overlaps(span))
    }

    /// Number of clips on this track.
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }
}
