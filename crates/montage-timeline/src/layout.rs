//! Canonical clip layout with mutation operations and bounded undo.
//!
//! The store owns the track/clip data and is the only place mutations
//! happen. Every operation either fully applies (including the duration
//! recompute) or is rejected before any state changes; expected failures
//! (no valid drop position, undo with empty history, unknown ids) are
//! ordinary boolean/Option returns, never errors.

use montage_core::{TimeSpan, TimelineMs};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clip::{Clip, ClipSpec};
use crate::track::{Track, TrackKind};

/// Maximum number of undo snapshots kept; the oldest is evicted beyond this.
pub const HISTORY_DEPTH: usize = 10;

/// An immutable snapshot of the layout, handed to the Composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Tracks in display order
    pub tracks: Vec<Track>,
    /// Latest clip end across all tracks, in ms
    pub total_duration: TimelineMs,
}

/// Owns the canonical track/clip data, mutation operations, and a bounded
/// undo history of whole-layout snapshots.
#[derive(Debug)]
pub struct ClipLayoutStore {
    tracks: Vec<Track>,
    total_duration: TimelineMs,
    /// Deep-copied `tracks` snapshots, oldest first.
    history: Vec<Vec<Track>>,
    /// Position of the snapshot `undo` restores next; -1 = nothing to undo.
    history_index: isize,
}

impl ClipLayoutStore {
    /// Create an empty store with no tracks.
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            total_duration: 0,
            history: Vec::new(),
            history_index: -1,
        }
    }

    /// Create a store with the given tracks.
    pub fn with_tracks(tracks: Vec<Track>) -> Self {
        let mut store = Self::new();
        store.tracks = tracks;
        store.recalculate_duration();
        store
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// All tracks in display order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Find a track by ID.
    pub fn track(&self, id: Uuid) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Find a clip anywhere in the layout. Returns the owning track too.
    pub fn find_clip(&self, clip_id: Uuid) -> Option<(&Track, &Clip)> {
        self.tracks
            .iter()
            .find_map(|t| t.find_clip(clip_id).map(|c| (t, c)))
    }

    /// Latest clip end across all tracks.
    pub fn total_duration(&self) -> TimelineMs {
        self.total_duration
    }

    /// Whether an undo snapshot is available.
    pub fn can_undo(&self) -> bool {
        self.history_index >= 0
    }

    /// Snapshot the current layout for the Composer.
    pub fn timeline(&self) -> Timeline {
        Timeline {
            tracks: self.tracks.clone(),
            total_duration: self.total_duration,
        }
    }

    // ── Structural mutations ────────────────────────────────────────

    /// Append a track of the given kind, numbered after its siblings.
    pub fn add_track(&mut self, kind: TrackKind) -> Uuid {
        let number = self.tracks.iter().filter(|t| t.kind == kind).count() as u32 + 1;
        let track = Track::new(kind, number);
        let id = track.id;
        self.tracks.push(track);
        id
    }

    /// Insert a new clip into a track, sorted by start time.
    ///
    /// No collision check is performed: overlap on insert is permitted.
    /// Returns `None` (warned no-op) for an unknown track.
    pub fn add_clip(&mut self, track_id: Uuid, spec: ClipSpec) -> Option<Clip> {
        let Some(track) = self.tracks.iter_mut().find(|t| t.id == track_id) else {
            warn!(track = %track_id, "add_clip: unknown track");
            return None;
        };
        let clip = Clip::from_spec(spec);
        track.insert_sorted(clip.clone());
        self.recalculate_duration();
        Some(clip)
    }

    /// Remove a clip from the layout. Records history before the removal.
    pub fn remove_clip(&mut self, clip_id: Uuid) -> bool {
        let Some((track_index, _)) = self.locate(clip_id) else {
            warn!(clip = %clip_id, "remove_clip: unknown clip");
            return false;
        };
        self.record_history();
        self.tracks[track_index].remove_clip(clip_id);
        self.recalculate_duration();
        true
    }

    /// Move a clip along its own track, steering around collisions.
    ///
    /// If the desired placement collides with another clip on the track, the
    /// nearest non-colliding position is chosen among: before the first
    /// clip, each inter-clip gap large enough to hold the clip, and after
    /// the last clip. The start is clamped to >= 0. Returns `false` when
    /// nothing changes.
    ///
    /// When `record_history` is true a snapshot is taken before the
    /// mutation, so a drag records its pre-move state once on completion
    /// rather than on every intermediate delta.
    pub fn move_clip(
        &mut self,
        clip_id: Uuid,
        desired_start: TimelineMs,
        record_history: bool,
    ) -> bool {
        let Some((track_index, clip_index)) = self.locate(clip_id) else {
            warn!(clip = %clip_id, "move_clip: unknown clip");
            return false;
        };
        let (visible, current_start) = {
            let clip = &self.tracks[track_index].clips[clip_index];
            (clip.visible_duration(), clip.start_time)
        };
        let desired = desired_start.max(0);
        let Some(new_start) =
            resolve_drop_position(&self.tracks[track_index].clips, clip_id, desired, visible)
        else {
            debug!(clip = %clip_id, desired, "move_clip: no valid drop position");
            return false;
        };
        if new_start == current_start {
            return false;
        }
        if record_history {
            self.record_history();
        }
        let track = &mut self.tracks[track_index];
        if let Some(clip) = track.find_clip_mut(clip_id) {
            clip.start_time = new_start;
        }
        track.sort_clips();
        self.recalculate_duration();
        true
    }

    /// Relocate a clip to a different track, preserving its start time.
    ///
    /// Fails (no mutation) if the target track has any clip overlapping the
    /// clip's span, or if source and target are the same track. Records
    /// history before the move.
    pub fn move_clip_to_track(&mut self, clip_id: Uuid, target_track_id: Uuid) -> bool {
        let Some((source_index, clip_index)) = self.locate(clip_id) else {
            warn!(clip = %clip_id, "move_clip_to_track: unknown clip");
            return false;
        };
        let Some(target_index) = self.tracks.iter().position(|t| t.id == target_track_id) else {
            warn!(track = %target_track_id, "move_clip_to_track: unknown target track");
            return false;
        };
        if source_index == target_index {
            return false;
        }
        let span = self.tracks[source_index].clips[clip_index].span();
        if self.tracks[target_index].has_overlap(span, None) {
            debug!(clip = %clip_id, target = %target_track_id, "move_clip_to_track: target occupied");
            return false;
        }
        self.record_history();
        if let Some(clip) = self.tracks[source_index].remove_clip(clip_id) {
            self.tracks[target_index].insert_sorted(clip);
        }
        self.recalculate_duration();
        true
    }

    /// Split a clip at a timeline position strictly inside its visible span.
    ///
    /// The clip is replaced by two adjacent clips whose combined visible
    /// span and trim offsets exactly reconstruct the original: no gap, no
    /// overlap, no duration loss. Records history before the split.
    pub fn split_clip(&mut self, clip_id: Uuid, split_time: TimelineMs) -> bool {
        let Some((track_index, clip_index)) = self.locate(clip_id) else {
            warn!(clip = %clip_id, "split_clip: unknown clip");
            return false;
        };
        {
            let clip = &self.tracks[track_index].clips[clip_index];
            if split_time <= clip.start_time || split_time >= clip.end_time() {
                debug!(clip = %clip_id, split_time, "split_clip: split point outside clip");
                return false;
            }
        }
        self.record_history();

        let track = &mut self.tracks[track_index];
        let offset = split_time - track.clips[clip_index].start_time;
        let mut right = track.clips[clip_index].clone();
        right.id = Uuid::new_v4();
        right.start_time = split_time;
        right.trim_in += offset;

        let left = &mut track.clips[clip_index];
        left.trim_out = left.trim_in + offset;

        track.insert_sorted(right);
        self.recalculate_duration();
        true
    }

    // ── Undo history ────────────────────────────────────────────────

    /// Restore the layout from the current undo snapshot.
    ///
    /// With an empty history this is a warned no-op.
    pub fn undo(&mut self) {
        if self.history_index < 0 {
            warn!("undo requested with empty history");
            return;
        }
        self.tracks = self.history[self.history_index as usize].clone();
        self.recalculate_duration();
        self.history_index -= 1;
    }

    /// Record a deep-copy snapshot of `tracks` before a mutation.
    ///
    /// Entries past the pointer are dropped (a new edit invalidates the
    /// branch undone away from) and the oldest entry is evicted beyond
    /// [`HISTORY_DEPTH`].
    fn record_history(&mut self) {
        let keep = (self.history_index + 1).max(0) as usize;
        self.history.truncate(keep);
        self.history.push(self.tracks.clone());
        if self.history.len() > HISTORY_DEPTH {
            self.history.remove(0);
        }
        self.history_index = self.history.len() as isize - 1;
    }

    /// Recompute `total_duration` as the latest clip end across all tracks.
    pub fn recalculate_duration(&mut self) {
        self.total_duration = self.tracks.iter().map(Track::end_time).max().unwrap_or(0);
    }

    /// Locate a clip as (track index, clip index).
    fn locate(&self, clip_id: Uuid) -> Option<(usize, usize)> {
        self.tracks.iter().enumerate().find_map(|(ti, track)| {
            track
                .clips
                .iter()
                .position(|c| c.id == clip_id)
                .map(|ci| (ti, ci))
        })
    }
}

impl Default for ClipLayoutStore {
    /// The standard starting layout: two video tracks and one audio track.
    fn default() -> Self {
        Self::with_tracks(vec![
            Track::new_video(1),
            Track::new_video(2),
            Track::new_audio(1),
        ])
    }
}

/// Find the placement for a clip of length `visible` nearest to `desired`.
///
/// Returns `desired` unchanged when it collides with nothing. Otherwise the
/// candidate positions are the nearest feasible starts inside each region
/// that can hold the clip: before the first clip, each inter-clip gap large
/// enough, and after the last clip.
fn resolve_drop_position(
    clips: &[Clip],
    moving: Uuid,
    desired: TimelineMs,
    visible: TimelineMs,
) -> Option<TimelineMs> {
    let others: Vec<&Clip> = clips.iter().filter(|c| c.id != moving).collect();
    let desired_span = TimeSpan::new(desired, visible);
    if !others.iter().any(|c| c.span().overlaps(desired_span)) {
        return Some(desired);
    }

    let mut candidates: Vec<TimelineMs> = Vec::new();
    if let Some(first) = others.first() {
        if first.start_time >= visible {
            candidates.push(desired.clamp(0, first.start_time - visible));
        }
    }
    for pair in others.windows(2) {
        let gap_start = pair[0].end_time();
        let gap_end = pair[1].start_time;
        if gap_end - gap_start >= visible {
            candidates.push(desired.clamp(gap_start, gap_end - visible));
        }
    }
    if let Some(last) = others.last() {
        candidates.push(desired.max(last.end_time()));
    }

    candidates.into_iter().min_by_key(|c| (c - desired).abs())
}
