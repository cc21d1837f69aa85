//! Composition resolver: read-only queries over a track snapshot.
//!
//! Every query is a pure function of `&[Track]` and a query time; nothing
//! here mutates. The set of all clip starts and ends partitions the
//! timeline into regions of constant composition, and the playback
//! synchronizer re-resolves only when a boundary is crossed.
//!
//! Queries are linear in total clip count and expected to fit a 60 fps
//! frame budget; exceeding it logs a warning but is never fatal.

use std::time::Instant;

use montage_core::TimelineMs;
use smallvec::SmallVec;
use tracing::warn;
use uuid::Uuid;

use crate::clip::Clip;
use crate::track::{Track, TrackKind};

/// Per-query time budget (one 60 fps frame).
pub const QUERY_BUDGET_MS: u128 = 16;

/// A clip found active at a query time, with its track context.
#[derive(Debug, Clone)]
pub struct ActiveClip {
    /// The active clip
    pub clip: Clip,
    /// Owning track ID
    pub track_id: Uuid,
    /// Owning track display number
    pub track_number: u32,
    /// Owning track kind
    pub track_kind: TrackKind,
    /// Offset of the query time into the clip's visible span
    pub relative_time: TimelineMs,
}

/// All clips active at `time` across every track, in track order.
///
/// A clip is active iff `time` lies in `[start_time, end_time)` - inclusive
/// start, exclusive end. Multi-track composition is the normal case: one
/// entry is returned per active clip, with no deduplication even for
/// same-track overlaps.
pub fn active_clips_at(tracks: &[Track], time: TimelineMs) -> SmallVec<[ActiveClip; 4]> {
    let started = Instant::now();
    let mut hits = SmallVec::new();
    for track in tracks {
        for clip in &track.clips {
            if clip.is_active_at(time) {
                hits.push(ActiveClip {
                    clip: clip.clone(),
                    track_id: track.id,
                    track_number: track.number,
                    track_kind: track.kind,
                    relative_time: time - clip.start_time,
                });
            }
        }
    }
    warn_if_slow("active_clips_at", started);
    hits
}

/// Whether `time` falls in a gap: zero active clips on any track.
///
/// Holds as an identity with [`active_clips_at`] for all `time`.
pub fn detect_gaps(tracks: &[Track], time: TimelineMs) -> bool {
    active_clips_at(tracks, time).is_empty()
}

/// The next clip start or end strictly after `time`, across all tracks.
///
/// `None` once no boundary lies ahead. The synchronizer uses this to avoid
/// re-resolving the active set every frame.
pub fn next_clip_boundary(tracks: &[Track], time: TimelineMs) -> Option<TimelineMs> {
    let started = Instant::now();
    let mut next: Option<TimelineMs> = None;
    for track in tracks {
        for clip in &track.clips {
            for boundary in [clip.start_time, clip.end_time()] {
                if boundary > time && next.map_or(true, |n| boundary < n) {
                    next = Some(boundary);
                }
            }
        }
    }
    warn_if_slow("next_clip_boundary", started);
    next
}

/// Active clips at `time` filtered to audio tracks.
pub fn active_audio_clips(tracks: &[Track], time: TimelineMs) -> SmallVec<[ActiveClip; 4]> {
    let mut hits = active_clips_at(tracks, time);
    hits.retain(|c| c.track_kind == TrackKind::Audio);
    hits
}

/// The clip active at `time` on one specific track.
pub fn clip_at_time(tracks: &[Track], track_id: Uuid, time: TimelineMs) -> Option<&Clip> {
    tracks
        .iter()
        .find(|t| t.id == track_id)?
        .clips
        .iter()
        .find(|c| c.is_active_at(time))
}

/// The next clip on the same track after `current` ends.
///
/// Returns the clip with the smallest `start_time >= current.end_time()`,
/// excluding `current` itself.
pub fn next_clip<'a>(tracks: &'a [Track], track_id: Uuid, current: &Clip) -> Option<&'a Clip> {
    let end = current.end_time();
    tracks
        .iter()
        .find(|t| t.id == track_id)?
        .clips
        .iter()
        .filter(|c| c.id != current.id && c.start_time >= end)
        .min_by_key(|c| c.start_time)
}

/// Whether `time` is at or past the end of the composition.
///
/// An empty timeline is always at its end, for any `time`.
pub fn is_end_of_timeline(tracks: &[Track], time: TimelineMs) -> bool {
    if tracks.iter().all(|t| t.clips.is_empty()) {
        return true;
    }
    let end = tracks.iter().map(Track::end_time).max().unwrap_or(0);
    time >= end
}

fn warn_if_slow(query: &str, started: Instant) {
    let elapsed = started.elapsed().as_millis();
    if elapsed >= QUERY_BUDGET_MS {
        warn!(query, elapsed_ms = elapsed as u64, "composition query exceeded frame budget");
    }
}
