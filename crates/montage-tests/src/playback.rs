//! Integration tests for the playback synchronizer actor.
//!
//! Drives a spawned synchronizer task end to end through its handle, with
//! scripted Renderer/Composer stand-ins. Tests run on a paused tokio clock
//! so the interval loops advance deterministically.

use std::sync::Arc;
use std::time::Duration;

use montage_core::{MontageError, Result, TimelineMs};
use montage_playback::{
    Composer, FrameImage, PlaybackEvent, PlaybackSynchronizer, Renderer, SegmentKind,
    SegmentRender, SyncState, TimelineRender,
};
use montage_timeline::{ActiveClip, ClipLayoutStore, ClipSpec, Timeline};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

// ── Scripted collaborators ─────────────────────────────────────

#[derive(Default)]
struct ScriptedRenderer {
    inner: Mutex<RendererState>,
}

#[derive(Default)]
struct RendererState {
    loaded: Option<String>,
    playing: bool,
    position_secs: f64,
}

impl ScriptedRenderer {
    fn loaded(&self) -> Option<String> {
        self.inner.lock().loaded.clone()
    }

    fn set_position(&self, secs: f64) {
        self.inner.lock().position_secs = secs;
    }
}

impl Renderer for ScriptedRenderer {
    async fn load(&self, file_path: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.loaded = Some(file_path.to_string());
        inner.position_secs = 0.0;
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        self.inner.lock().playing = true;
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.inner.lock().playing = false;
        Ok(())
    }

    async fn seek(&self, seconds: f64) -> Result<()> {
        self.inner.lock().position_secs = seconds;
        Ok(())
    }

    async fn time(&self) -> Result<f64> {
        Ok(self.inner.lock().position_secs)
    }

    async fn duration(&self) -> Result<f64> {
        Ok(600.0)
    }

    async fn dimensions(&self) -> Result<(u32, u32)> {
        Ok((320, 180))
    }

    async fn capture_frame(&self) -> Result<FrameImage> {
        if self.inner.lock().loaded.is_none() {
            return Err(MontageError::Renderer("nothing loaded".into()));
        }
        Ok(FrameImage {
            width: 2,
            height: 2,
            data: vec![200; 16],
        })
    }

    async fn apply_volume_filter(&self, _percent: f64, _muted: bool) -> Result<()> {
        Ok(())
    }

    async fn apply_fade_filter(
        &self,
        _fade_in_ms: TimelineMs,
        _fade_out_ms: TimelineMs,
        _clip_duration_ms: TimelineMs,
    ) -> Result<()> {
        Ok(())
    }

    async fn clear_audio_filters(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct ScriptedComposer {
    renders: Mutex<u32>,
}

impl ScriptedComposer {
    fn render_count(&self) -> u32 {
        *self.renders.lock()
    }
}

impl Composer for ScriptedComposer {
    async fn classify_segment(&self, _active_clips: &[ActiveClip]) -> Result<SegmentKind> {
        Ok(SegmentKind::Complex)
    }

    async fn render_segment(
        &self,
        _active_clips: &[ActiveClip],
        start_time: TimelineMs,
        duration: TimelineMs,
    ) -> Result<SegmentRender> {
        *self.renders.lock() += 1;
        Ok(SegmentRender {
            output_path: format!("/tmp/segment-{start_time}-{duration}.mp4"),
        })
    }

    async fn render_full_timeline(&self, timeline: &Timeline) -> Result<TimelineRender> {
        *self.renders.lock() += 1;
        Ok(TimelineRender {
            output_path: "/tmp/timeline.mp4".into(),
            duration_ms: timeline.total_duration,
        })
    }
}

// ── Helpers ────────────────────────────────────────────────────

struct Actor {
    handle: montage_playback::PlaybackHandle,
    events: mpsc::UnboundedReceiver<PlaybackEvent>,
    renderer: Arc<ScriptedRenderer>,
    composer: Arc<ScriptedComposer>,
    task: tokio::task::JoinHandle<()>,
}

fn spawn_actor(build: impl FnOnce(&mut ClipLayoutStore)) -> Actor {
    let mut store = ClipLayoutStore::default();
    build(&mut store);
    let renderer = Arc::new(ScriptedRenderer::default());
    let composer = Arc::new(ScriptedComposer::default());
    let (handle, events, task) = PlaybackSynchronizer::spawn(
        Arc::clone(&renderer),
        Arc::clone(&composer),
        Arc::new(RwLock::new(store)),
        None,
    );
    Actor {
        handle,
        events,
        renderer,
        composer,
        task,
    }
}

async fn wait_for_state(actor: &Actor, wanted: SyncState) {
    let mut state = actor.handle.state_watch();
    timeout(WAIT, state.wait_for(|s| *s == wanted))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {wanted:?}"))
        .expect("state channel open");
}

async fn wait_for_event(
    events: &mut mpsc::UnboundedReceiver<PlaybackEvent>,
    pred: impl Fn(&PlaybackEvent) -> bool,
) -> PlaybackEvent {
    timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("events channel open");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

// ── Direct path ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn play_loads_clip_and_reaches_playing_state() {
    let actor = spawn_actor(|store| {
        let track = store.tracks()[0].id;
        store.add_clip(track, ClipSpec::full("media/a.mp4", 0, 5000));
    });

    actor.handle.play();
    wait_for_state(&actor, SyncState::PlayingSingle).await;
    assert_eq!(actor.renderer.loaded().as_deref(), Some("media/a.mp4"));
}

#[tokio::test(start_paused = true)]
async fn frames_are_delivered_on_capture_cadence() {
    let mut actor = spawn_actor(|store| {
        let track = store.tracks()[0].id;
        store.add_clip(track, ClipSpec::full("media/a.mp4", 0, 5000));
    });

    actor.handle.play();
    let event = wait_for_event(&mut actor.events, |e| matches!(e, PlaybackEvent::Frame(_))).await;
    let PlaybackEvent::Frame(frame) = event else {
        unreachable!();
    };
    assert_eq!((frame.width, frame.height), (2, 2));
}

#[tokio::test(start_paused = true)]
async fn seek_publishes_composition_time() {
    let actor = spawn_actor(|store| {
        let track = store.tracks()[0].id;
        store.add_clip(track, ClipSpec::full("media/a.mp4", 1000, 5000));
    });

    actor.handle.seek(3500);
    let mut time = actor.handle.time_watch();
    timeout(WAIT, time.wait_for(|t| *t == 3500))
        .await
        .expect("timed out waiting for seek")
        .expect("time channel open");
}

#[tokio::test(start_paused = true)]
async fn completion_event_fires_at_end_of_timeline() {
    let mut actor = spawn_actor(|store| {
        let track = store.tracks()[0].id;
        store.add_clip(track, ClipSpec::full("media/a.mp4", 0, 5000));
    });

    actor.handle.play();
    wait_for_state(&actor, SyncState::PlayingSingle).await;

    actor.renderer.set_position(5.0);
    wait_for_event(&mut actor.events, |e| matches!(e, PlaybackEvent::Completed)).await;
    wait_for_state(&actor, SyncState::Stopped).await;
    assert_eq!(actor.handle.current_time(), 0);
}

// ── Segment path ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn overlapping_region_plays_prerendered_segment() {
    let actor = spawn_actor(|store| {
        let v1 = store.tracks()[0].id;
        let v2 = store.tracks()[1].id;
        store.add_clip(v1, ClipSpec::full("media/base.mp4", 1000, 5000));
        store.add_clip(v2, ClipSpec::full("media/overlay.mp4", 2000, 3000));
    });

    actor.handle.seek(3000);
    actor.handle.play();
    wait_for_state(&actor, SyncState::PlayingSegment).await;

    // The flattened region ends at the overlay's end: 2000ms long.
    assert_eq!(
        actor.renderer.loaded().as_deref(),
        Some("/tmp/segment-3000-2000.mp4")
    );
    assert!(actor.composer.render_count() >= 1);
}

#[tokio::test(start_paused = true)]
async fn prerender_timeline_loads_flat_file() {
    let actor = spawn_actor(|store| {
        let v1 = store.tracks()[0].id;
        let v2 = store.tracks()[1].id;
        store.add_clip(v1, ClipSpec::full("media/base.mp4", 0, 4000));
        store.add_clip(v2, ClipSpec::full("media/overlay.mp4", 1000, 2000));
    });

    actor.handle.prerender_timeline();
    let mut state = actor.handle.state_watch();
    timeout(WAIT, state.wait_for(|s| *s == SyncState::Idle))
        .await
        .expect("timed out waiting for prerender")
        .expect("state channel open");
    assert_eq!(actor.renderer.loaded().as_deref(), Some("/tmp/timeline.mp4"));
}

// ── Gap handling ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn gap_playhead_advances_and_enters_clip() {
    let actor = spawn_actor(|store| {
        let track = store.tracks()[0].id;
        store.add_clip(track, ClipSpec::full("media/late.mp4", 500, 2000));
    });

    actor.handle.play();
    wait_for_state(&actor, SyncState::Gap).await;
    // The wall-clock playhead crosses the 500ms boundary into the clip.
    wait_for_state(&actor, SyncState::PlayingSingle).await;
    assert_eq!(actor.renderer.loaded().as_deref(), Some("media/late.mp4"));
}

// ── Progress relay & shutdown ──────────────────────────────────

#[tokio::test(start_paused = true)]
async fn composer_progress_is_relayed_upstream() {
    let mut store = ClipLayoutStore::default();
    let track = store.tracks()[0].id;
    store.add_clip(track, ClipSpec::full("media/a.mp4", 0, 2000));

    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let renderer = Arc::new(ScriptedRenderer::default());
    let composer = Arc::new(ScriptedComposer::default());
    let (_handle, mut events, _task) = PlaybackSynchronizer::spawn(
        renderer,
        composer,
        Arc::new(RwLock::new(store)),
        Some(progress_rx),
    );

    progress_tx.send(42.0).expect("progress channel open");
    let event = wait_for_event(&mut events, |e| {
        matches!(e, PlaybackEvent::RenderProgress(_))
    })
    .await;
    let PlaybackEvent::RenderProgress(percent) = event else {
        unreachable!();
    };
    assert_eq!(percent, 42.0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_ends_the_actor_task() {
    let actor = spawn_actor(|store| {
        let track = store.tracks()[0].id;
        store.add_clip(track, ClipSpec::full("media/a.mp4", 0, 2000));
    });

    actor.handle.shutdown();
    timeout(WAIT, actor.task)
        .await
        .expect("timed out waiting for shutdown")
        .expect("actor task panicked");
}
