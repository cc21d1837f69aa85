//! Integration tests for the layout subsystem.
//!
//! Exercises cross-crate interactions between the layout store, the
//! composition resolver, and layout persistence.

use montage_core::TimelineMs;
use montage_timeline::{resolver, ClipLayoutStore, ClipSpec, LayoutFile, TrackKind};
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────

fn add(store: &mut ClipLayoutStore, track: Uuid, path: &str, start: TimelineMs, len: TimelineMs) -> Uuid {
    store
        .add_clip(track, ClipSpec::full(path, start, len))
        .expect("track exists")
        .id
}

/// V1 holds [0,1000) and [1500,2500); V2 holds [2000,5000).
fn build_layout() -> ClipLayoutStore {
    let mut store = ClipLayoutStore::default();
    let v1 = store.tracks()[0].id;
    let v2 = store.tracks()[1].id;
    add(&mut store, v1, "media/intro.mp4", 0, 1000);
    add(&mut store, v1, "media/body.mp4", 1500, 1000);
    add(&mut store, v2, "media/overlay.mp4", 2000, 3000);
    store
}

// ── Boundary laws ──────────────────────────────────────────────

#[test]
fn active_at_start_inclusive_end_exclusive() {
    let store = build_layout();
    let tracks = store.tracks();

    // Clip [1500,2500): included at its start, excluded at its end.
    let at_start = resolver::active_clips_at(tracks, 1500);
    assert!(at_start.iter().any(|c| c.clip.start_time == 1500));
    let at_end = resolver::active_clips_at(tracks, 2500);
    assert!(!at_end.iter().any(|c| c.clip.start_time == 1500));
}

#[test]
fn gap_identity_holds_across_mutations() {
    let mut store = build_layout();
    let body = store.tracks()[0].clips[1].id;
    store.move_clip(body, 7000, true);
    store.split_clip(store.tracks()[1].clips[0].id, 3000);

    for t in (0..10_000).step_by(250) {
        assert_eq!(
            resolver::detect_gaps(store.tracks(), t),
            resolver::active_clips_at(store.tracks(), t).is_empty(),
            "identity diverged at t={t}"
        );
    }
}

#[test]
fn total_duration_tracks_every_mutation() {
    let mut store = build_layout();
    assert_eq!(store.total_duration(), 5000);

    let body = store.tracks()[0].clips[1].id;
    assert!(store.move_clip(body, 9000, true));
    assert_eq!(store.total_duration(), 10_000);

    store.undo();
    assert_eq!(store.total_duration(), 5000);
}

// ── Mutations seen through the resolver ────────────────────────

#[test]
fn moved_clip_resolves_at_new_position() {
    let mut store = build_layout();
    let intro = store.tracks()[0].clips[0].id;

    assert!(store.move_clip(intro, 6000, true));
    assert!(resolver::detect_gaps(store.tracks(), 500));
    let active = resolver::active_clips_at(store.tracks(), 6500);
    assert!(active.iter().any(|c| c.clip.id == intro));
}

#[test]
fn cross_track_move_keeps_composition_time() {
    let mut store = build_layout();
    let v2 = store.tracks()[1].id;
    let body = store.tracks()[0].clips[1].id; // [1500,2500)

    // V2's clip occupies [2000,5000): overlap, move rejected.
    assert!(!store.move_clip_to_track(body, v2));

    // After clearing the overlap the move succeeds, start preserved.
    let overlay = store.tracks()[1].clips[0].id;
    assert!(store.move_clip(overlay, 5000, true));
    assert!(store.move_clip_to_track(body, v2));

    let active = resolver::active_clips_at(store.tracks(), 1600);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].track_number, 2);
    assert_eq!(active[0].relative_time, 100);
}

#[test]
fn split_leaves_no_gap_and_no_overlap() {
    let mut store = build_layout();
    let overlay = store.tracks()[1].clips[0].id; // [2000,5000)

    assert!(store.split_clip(overlay, 3500));
    let track = &store.tracks()[1];
    assert_eq!(track.clip_count(), 2);

    // Every millisecond of the original span resolves to exactly one clip
    // on that track.
    for t in 2000..5000 {
        let active = resolver::clip_at_time(store.tracks(), track.id, t);
        assert!(active.is_some(), "gap introduced at t={t}");
    }
    assert_eq!(track.clips[0].end_time(), track.clips[1].start_time);
}

#[test]
fn undo_restores_resolver_results() {
    let mut store = build_layout();
    let before: Vec<usize> = (0..6)
        .map(|i| resolver::active_clips_at(store.tracks(), i * 1000).len())
        .collect();

    let intro = store.tracks()[0].clips[0].id;
    assert!(store.move_clip(intro, 8000, true));
    store.undo();

    let after: Vec<usize> = (0..6)
        .map(|i| resolver::active_clips_at(store.tracks(), i * 1000).len())
        .collect();
    assert_eq!(before, after);
}

// ── Boundary computation ───────────────────────────────────────

#[test]
fn boundaries_partition_the_timeline() {
    let store = build_layout();
    let tracks = store.tracks();

    // Walk the timeline boundary to boundary; the active set must be
    // constant strictly inside each region.
    let mut t = 0;
    while let Some(next) = resolver::next_clip_boundary(tracks, t) {
        assert!(next > t);
        let count_at_start = resolver::active_clips_at(tracks, t).len();
        let mid = t + (next - t) / 2;
        assert_eq!(
            resolver::active_clips_at(tracks, mid).len(),
            count_at_start,
            "active set changed inside region [{t},{next})"
        );
        t = next;
    }
    assert!(resolver::is_end_of_timeline(tracks, t));
}

// ── Persistence ────────────────────────────────────────────────

#[test]
fn layout_survives_serialization_roundtrip() {
    let mut store = build_layout();
    let overlay = store.tracks()[1].clips[0].id;
    store.split_clip(overlay, 3000);

    let file = LayoutFile::new(store.timeline());
    let json = file.to_json().unwrap();
    let loaded = LayoutFile::from_json(&json).unwrap();

    let restored = ClipLayoutStore::with_tracks(loaded.timeline.tracks);
    assert_eq!(restored.total_duration(), store.total_duration());
    for t in [500, 1250, 1600, 2999, 3000, 4999] {
        assert_eq!(
            resolver::active_clips_at(restored.tracks(), t).len(),
            resolver::active_clips_at(store.tracks(), t).len(),
            "composition diverged at t={t}"
        );
    }
}

// ── Track management ───────────────────────────────────────────

#[test]
fn added_track_participates_in_composition() {
    let mut store = build_layout();
    let v3 = store.add_track(TrackKind::Video);
    add(&mut store, v3, "media/title.mp4", 400, 600);

    let active = resolver::active_clips_at(store.tracks(), 500);
    assert_eq!(active.len(), 2); // intro on V1 + title on V3
    assert!(active.iter().any(|c| c.track_number == 3));
}
