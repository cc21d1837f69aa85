//! Playback synchronizer.
//!
//! Keeps on-screen playback consistent with the resolved composition. One
//! actor task owns every piece of mutable state (single-writer discipline);
//! a `select!` loop multiplexes:
//! - the ~60 fps time-sync tick, active only while playing
//! - the ~15 fps frame-capture tick, decoupled to bound pixel-query cost
//! - control commands (play, pause, stop, seek, select, layout changed)
//! - completion of the in-flight segment render
//! - composer progress messages, relayed upstream
//!
//! Region changes - not per-frame ticks - drive state transitions: the
//! active-clip set is re-resolved only on boundary crossings, seeks, and
//! layout-change notifications. Renders run as spawned tasks stamped with a
//! generation counter; results arriving after the synchronizer has moved to
//! a different region are discarded.

use std::sync::Arc;
use std::time::Duration;

use montage_core::{ms_to_secs, secs_to_ms, MontageError, TimelineMs};
use montage_timeline::{resolver, ActiveClip, ClipLayoutStore, TrackKind};
use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::composer::{Composer, SegmentKind};
use crate::renderer::{FrameImage, Renderer};

/// Time-sync tick period (~60 fps).
pub const SYNC_TICK: Duration = Duration::from_millis(16);

/// Frame-capture tick period (~15 fps).
pub const CAPTURE_TICK: Duration = Duration::from_millis(66);

/// Jitter window within which a cached segment is reused without re-render.
pub const SEGMENT_REUSE_TOLERANCE_MS: TimelineMs = 100;

/// Black-frame size used before the renderer has reported dimensions.
const FALLBACK_DIMENSIONS: (u32, u32) = (1920, 1080);

/// Synchronizer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No command has been processed yet.
    Uninitialized,
    /// Region resolved, renderer paused.
    Idle,
    /// Waiting for a single-clip load to resolve.
    LoadingSingle,
    /// Waiting for a segment render/load to resolve.
    LoadingSegment,
    /// Playing one clip through the direct path.
    PlayingSingle,
    /// Playing a pre-rendered multi-track segment.
    PlayingSegment,
    /// Zero active video clips; black frames, wall-clock playhead.
    Gap,
    /// End of timeline reached (or explicit stop).
    Stopped,
    /// An external command failed; recovers on the next re-sync.
    Error,
}

/// Bookkeeping for the currently loaded pre-rendered segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentCache {
    /// Whether the renderer is playing a flattened segment file.
    pub is_playing_segment: bool,
    /// Global timeline position the segment starts at, in ms.
    pub segment_start_time: TimelineMs,
    /// Length of the rendered segment, in ms.
    pub segment_duration: TimelineMs,
}

/// Control commands accepted by the synchronizer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Stop,
    /// Seek to a global timeline position in ms.
    Seek(TimelineMs),
    /// Select (or deselect) the clip audio filters apply to.
    SelectClip(Option<Uuid>),
    /// The layout store was mutated; re-resolve the current region.
    LayoutChanged,
    /// Flatten the whole timeline and load it for playback.
    PrerenderTimeline,
    Shutdown,
}

/// Notifications emitted toward the UI.
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// A captured (or synthesized black) frame, on the capture cadence.
    Frame(FrameImage),
    /// Playback reached the end of the timeline.
    Completed,
    /// Percent-complete progress relayed from the Composer.
    RenderProgress(f32),
    /// A non-fatal external command failure.
    CommandFailed(String),
}

/// A finished render delivered back to the actor task.
#[derive(Debug)]
struct RenderOutcome {
    generation: u64,
    start_time: TimelineMs,
    result: montage_core::Result<RenderedFile>,
}

#[derive(Debug)]
struct RenderedFile {
    output_path: String,
    duration: TimelineMs,
}

/// Cloneable control handle for a spawned synchronizer task.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    commands: mpsc::UnboundedSender<Command>,
    time: watch::Receiver<TimelineMs>,
    state: watch::Receiver<SyncState>,
}

impl PlaybackHandle {
    pub fn play(&self) {
        let _ = self.commands.send(Command::Play);
    }

    pub fn pause(&self) {
        let _ = self.commands.send(Command::Pause);
    }

    pub fn stop(&self) {
        let _ = self.commands.send(Command::Stop);
    }

    pub fn seek(&self, time: TimelineMs) {
        let _ = self.commands.send(Command::Seek(time));
    }

    pub fn select_clip(&self, clip: Option<Uuid>) {
        let _ = self.commands.send(Command::SelectClip(clip));
    }

    pub fn layout_changed(&self) {
        let _ = self.commands.send(Command::LayoutChanged);
    }

    pub fn prerender_timeline(&self) {
        let _ = self.commands.send(Command::PrerenderTimeline);
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    /// Latest published composition time, in ms.
    pub fn current_time(&self) -> TimelineMs {
        *self.time.borrow()
    }

    /// Latest published synchronizer state.
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Watch channel of the composition time, for UI playhead binding.
    pub fn time_watch(&self) -> watch::Receiver<TimelineMs> {
        self.time.clone()
    }

    /// Watch channel of the synchronizer state.
    pub fn state_watch(&self) -> watch::Receiver<SyncState> {
        self.state.clone()
    }
}

/// Orchestrates the external Renderer and Composer so that on-screen
/// playback matches the composition resolved from the layout store.
pub struct PlaybackSynchronizer<R, C> {
    renderer: Arc<R>,
    composer: Arc<C>,
    layout: Arc<RwLock<ClipLayoutStore>>,

    state: SyncState,
    playing: bool,
    current_time: TimelineMs,
    cache: SegmentCache,
    loaded_path: Option<String>,
    /// Start time of the clip playing through the direct path.
    direct_clip_start: TimelineMs,
    next_boundary: Option<TimelineMs>,
    needs_resync: bool,
    pending_seek: Option<TimelineMs>,
    selected_clip: Option<Uuid>,
    filters_applied: bool,
    /// Stamped onto spawned renders; results from older stamps are stale.
    generation: u64,
    frame_dimensions: Option<(u32, u32)>,
    last_tick: Option<Instant>,

    render_tx: mpsc::UnboundedSender<RenderOutcome>,
    render_rx: Option<mpsc::UnboundedReceiver<RenderOutcome>>,
    progress_rx: Option<mpsc::UnboundedReceiver<f32>>,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    time_tx: watch::Sender<TimelineMs>,
    state_tx: watch::Sender<SyncState>,
}

impl<R, C> PlaybackSynchronizer<R, C>
where
    R: Renderer + 'static,
    C: Composer + 'static,
{
    /// Create a synchronizer. `progress` is the Composer's percent-complete
    /// channel, relayed upstream as [`PlaybackEvent::RenderProgress`].
    pub fn new(
        renderer: Arc<R>,
        composer: Arc<C>,
        layout: Arc<RwLock<ClipLayoutStore>>,
        progress: Option<mpsc::UnboundedReceiver<f32>>,
    ) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (render_tx, render_rx) = mpsc::unbounded_channel();
        let (time_tx, _) = watch::channel(0);
        let (state_tx, _) = watch::channel(SyncState::Uninitialized);

        let sync = Self {
            renderer,
            composer,
            layout,
            state: SyncState::Uninitialized,
            playing: false,
            current_time: 0,
            cache: SegmentCache::default(),
            loaded_path: None,
            direct_clip_start: 0,
            next_boundary: None,
            needs_resync: false,
            pending_seek: None,
            selected_clip: None,
            filters_applied: false,
            generation: 0,
            frame_dimensions: None,
            last_tick: None,
            render_tx,
            render_rx: Some(render_rx),
            progress_rx: progress,
            events: events_tx,
            time_tx,
            state_tx,
        };
        (sync, events_rx)
    }

    /// Spawn the synchronizer as its own actor task.
    pub fn spawn(
        renderer: Arc<R>,
        composer: Arc<C>,
        layout: Arc<RwLock<ClipLayoutStore>>,
        progress: Option<mpsc::UnboundedReceiver<f32>>,
    ) -> (
        PlaybackHandle,
        mpsc::UnboundedReceiver<PlaybackEvent>,
        JoinHandle<()>,
    ) {
        let (sync, events) = Self::new(renderer, composer, layout, progress);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let handle = PlaybackHandle {
            commands: commands_tx,
            time: sync.time_tx.subscribe(),
            state: sync.state_tx.subscribe(),
        };
        let task = tokio::spawn(sync.run(commands_rx));
        (handle, events, task)
    }

    /// The actor loop. Owns the synchronizer until shutdown.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let Some(mut render_rx) = self.render_rx.take() else {
            return;
        };
        let mut progress_rx = self.progress_rx.take();

        let mut sync_tick = interval(SYNC_TICK);
        sync_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut capture_tick = interval(CAPTURE_TICK);
        capture_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("playback synchronizer started");
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    None | Some(Command::Shutdown) => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },
                _ = sync_tick.tick(), if self.playing => {
                    let now = Instant::now();
                    let dt = self.last_tick.map(|t| now.duration_since(t)).unwrap_or_default();
                    self.last_tick = Some(now);
                    self.tick(dt).await;
                },
                _ = capture_tick.tick(), if self.state != SyncState::Uninitialized => {
                    self.capture_tick().await;
                },
                Some(outcome) = render_rx.recv() => {
                    self.apply_render_outcome(outcome).await;
                    self.process_pending_seek().await;
                },
                Some(percent) = recv_progress(&mut progress_rx) => {
                    let _ = self.events.send(PlaybackEvent::RenderProgress(percent));
                },
            }
        }
        info!("playback synchronizer shut down");
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current global composition time, in ms.
    pub fn current_time(&self) -> TimelineMs {
        self.current_time
    }

    pub fn segment_cache(&self) -> SegmentCache {
        self.cache
    }

    // ── Command handling ────────────────────────────────────────────

    /// Process one control command. All mutation funnels through here and
    /// the tick handlers, on the actor task.
    pub async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play => {
                self.playing = true;
                self.last_tick = None;
                self.sync_region().await;
                self.update_audio_filters().await;
                self.process_pending_seek().await;
            }
            Command::Pause => {
                self.playing = false;
                self.last_tick = None;
                if let Err(e) = self.renderer.pause().await {
                    self.fail(e);
                } else if matches!(
                    self.state,
                    SyncState::PlayingSingle | SyncState::PlayingSegment
                ) {
                    // The segment cache survives a pause; only stop and
                    // region changes invalidate it.
                    self.set_state(SyncState::Idle);
                }
                self.update_audio_filters().await;
            }
            Command::Stop => {
                self.playing = false;
                self.last_tick = None;
                self.generation += 1;
                self.pending_seek = None;
                self.cache = SegmentCache::default();
                self.current_time = 0;
                self.publish_time();
                if let Err(e) = self.renderer.pause().await {
                    self.fail(e);
                } else {
                    self.set_state(SyncState::Stopped);
                }
                self.update_audio_filters().await;
                self.needs_resync = true;
            }
            Command::Seek(target) => {
                let total = self.layout.read().total_duration();
                let target = target.clamp(0, total);
                // A new seek supersedes whatever was pending.
                self.generation += 1;
                self.pending_seek = Some(target);
                self.current_time = target;
                self.publish_time();
                self.sync_region().await;
                self.process_pending_seek().await;
            }
            Command::SelectClip(selection) => {
                self.selected_clip = selection;
                self.update_audio_filters().await;
            }
            Command::LayoutChanged => {
                self.generation += 1;
                self.needs_resync = false;
                self.sync_region().await;
            }
            Command::PrerenderTimeline => {
                self.start_timeline_render().await;
            }
            Command::Shutdown => {}
        }
    }

    // ── Time synchronization ────────────────────────────────────────

    /// One time-sync step: advance composition time, detect end-of-timeline,
    /// re-resolve the region on boundary crossings, retry a pending seek.
    ///
    /// `dt` is the wall-clock delta since the previous tick; it only drives
    /// the playhead during gaps, where nothing is loaded to query.
    pub async fn tick(&mut self, dt: Duration) {
        if !self.playing {
            return;
        }
        match self.state {
            SyncState::PlayingSingle => match self.renderer.time().await {
                Ok(secs) => self.current_time = self.direct_clip_start + secs_to_ms(secs),
                Err(e) => {
                    self.fail(e);
                    return;
                }
            },
            SyncState::PlayingSegment => match self.renderer.time().await {
                Ok(secs) => self.current_time = self.cache.segment_start_time + secs_to_ms(secs),
                Err(e) => {
                    self.fail(e);
                    return;
                }
            },
            SyncState::Gap => {
                self.current_time += dt.as_millis() as TimelineMs;
            }
            // Loading or errored: hold position until resolved.
            _ => {}
        }
        self.publish_time();

        let at_end = {
            let store = self.layout.read();
            resolver::is_end_of_timeline(store.tracks(), self.current_time)
        };
        if at_end {
            self.finish_playback().await;
            return;
        }

        if self.needs_resync || self.next_boundary.is_some_and(|b| self.current_time >= b) {
            self.needs_resync = false;
            self.sync_region().await;
        }
        if self.pending_seek.is_some() {
            self.process_pending_seek().await;
        }
    }

    /// One frame-capture step: deliver the renderer's current frame, or a
    /// synthesized black frame during gaps and errors.
    pub async fn capture_tick(&mut self) {
        let frame = match self.state {
            SyncState::Uninitialized => return,
            SyncState::Gap | SyncState::Error | SyncState::Stopped => self.black_frame(),
            _ if self.loaded_path.is_none() => self.black_frame(),
            _ => match self.renderer.capture_frame().await {
                Ok(frame) => frame,
                Err(e) => {
                    self.fail(e);
                    self.black_frame()
                }
            },
        };
        let _ = self.events.send(PlaybackEvent::Frame(frame));
    }

    // ── Region classification ───────────────────────────────────────

    /// Re-resolve the active-clip set at the current time and transition
    /// into the matching region: gap, direct single-clip, or segment.
    async fn sync_region(&mut self) {
        self.generation += 1;
        let time = self.current_time;
        let (active, boundary) = {
            let store = self.layout.read();
            (
                resolver::active_clips_at(store.tracks(), time).into_vec(),
                resolver::next_clip_boundary(store.tracks(), time),
            )
        };
        self.next_boundary = boundary;

        let video_count = active
            .iter()
            .filter(|c| c.track_kind == TrackKind::Video)
            .count();
        match video_count {
            0 => self.enter_gap().await,
            1 => {
                let clip = active
                    .iter()
                    .find(|c| c.track_kind == TrackKind::Video)
                    .cloned();
                if let Some(clip) = clip {
                    self.cache = SegmentCache::default();
                    self.enter_direct(&clip).await;
                }
            }
            _ => self.enter_segment(active).await,
        }
    }

    /// Zero active video clips: pause the renderer and show black.
    async fn enter_gap(&mut self) {
        self.cache = SegmentCache::default();
        if let Err(e) = self.renderer.pause().await {
            self.fail(e);
            return;
        }
        self.set_state(SyncState::Gap);
    }

    /// Exactly one active video clip: play its file directly.
    async fn enter_direct(&mut self, active: &ActiveClip) {
        let path = active.clip.file_path.as_str();
        if self.loaded_path.as_deref() != Some(path) {
            self.set_state(SyncState::LoadingSingle);
            if let Err(e) = self.renderer.load(path).await {
                self.fail(e);
                return;
            }
            self.loaded_path = Some(path.to_string());
            self.refresh_dimensions().await;
        }
        self.direct_clip_start = active.clip.start_time;
        if let Err(e) = self.renderer.seek(ms_to_secs(active.relative_time)).await {
            self.fail(e);
            return;
        }
        if self.playing {
            if let Err(e) = self.renderer.play().await {
                self.fail(e);
                return;
            }
            self.set_state(SyncState::PlayingSingle);
        } else {
            self.set_state(SyncState::Idle);
        }
    }

    /// Two or more active video clips: reuse the cached segment if it still
    /// covers this time, otherwise classify and pre-render the region.
    async fn enter_segment(&mut self, active: Vec<ActiveClip>) {
        let time = self.current_time;
        if self.cache.is_playing_segment
            && (time - self.cache.segment_start_time).abs() <= SEGMENT_REUSE_TOLERANCE_MS
        {
            // Minor jitter around the cached segment start; the rendered
            // file still covers this region.
            if self.playing {
                if let Err(e) = self.renderer.play().await {
                    self.fail(e);
                    return;
                }
                self.set_state(SyncState::PlayingSegment);
            } else {
                self.set_state(SyncState::Idle);
            }
            return;
        }

        self.cache = SegmentCache::default();
        if let Err(e) = self.renderer.pause().await {
            self.fail(e);
            return;
        }
        match self.composer.classify_segment(&active).await {
            Ok(SegmentKind::Simple) => {
                // One visible layer: play the top-most clip directly.
                let top = active
                    .iter()
                    .filter(|c| c.track_kind == TrackKind::Video)
                    .min_by_key(|c| c.track_number)
                    .cloned();
                if let Some(top) = top {
                    self.enter_direct(&top).await;
                }
            }
            Ok(SegmentKind::Complex) => {
                // The segment must end exactly where the composition next
                // changes: the nearest end among the active clips.
                let Some(duration) = active.iter().map(|c| c.clip.end_time() - time).min() else {
                    return;
                };
                self.start_segment_render(active, time, duration);
            }
            Err(e) => self.fail(e),
        }
    }

    /// Spawn a segment render stamped with the current generation.
    fn start_segment_render(
        &mut self,
        active: Vec<ActiveClip>,
        start_time: TimelineMs,
        duration: TimelineMs,
    ) {
        self.set_state(SyncState::LoadingSegment);
        let generation = self.generation;
        let composer = Arc::clone(&self.composer);
        let tx = self.render_tx.clone();
        tokio::spawn(async move {
            let result = composer
                .render_segment(&active, start_time, duration)
                .await
                .map(|render| RenderedFile {
                    output_path: render.output_path,
                    duration,
                });
            let _ = tx.send(RenderOutcome {
                generation,
                start_time,
                result,
            });
        });
    }

    /// Spawn a whole-timeline flatten and rewind to its start.
    async fn start_timeline_render(&mut self) {
        let timeline = self.layout.read().timeline();
        self.generation += 1;
        let generation = self.generation;
        self.cache = SegmentCache::default();
        self.current_time = 0;
        self.publish_time();
        self.set_state(SyncState::LoadingSegment);
        if let Err(e) = self.renderer.pause().await {
            self.fail(e);
            return;
        }
        let composer = Arc::clone(&self.composer);
        let tx = self.render_tx.clone();
        tokio::spawn(async move {
            let result = composer
                .render_full_timeline(&timeline)
                .await
                .map(|render| RenderedFile {
                    output_path: render.output_path,
                    duration: render.duration_ms,
                });
            let _ = tx.send(RenderOutcome {
                generation,
                start_time: 0,
                result,
            });
        });
    }

    /// Apply a finished render, unless the synchronizer has moved on.
    async fn apply_render_outcome(&mut self, outcome: RenderOutcome) {
        if outcome.generation != self.generation {
            debug!(
                start = outcome.start_time,
                "discarding stale segment render"
            );
            return;
        }
        match outcome.result {
            Ok(rendered) => {
                if let Err(e) = self.renderer.load(&rendered.output_path).await {
                    self.fail(e);
                    return;
                }
                self.loaded_path = Some(rendered.output_path);
                self.refresh_dimensions().await;
                self.cache = SegmentCache {
                    is_playing_segment: true,
                    segment_start_time: outcome.start_time,
                    segment_duration: rendered.duration,
                };
                if self.playing {
                    if let Err(e) = self.renderer.play().await {
                        self.fail(e);
                        return;
                    }
                    self.set_state(SyncState::PlayingSegment);
                } else {
                    self.set_state(SyncState::Idle);
                }
            }
            Err(e) => self.fail(e),
        }
    }

    // ── Seeks ───────────────────────────────────────────────────────

    /// Issue the pending seek, translated to renderer-local time. The
    /// target is cleared only once the renderer command resolves, so a
    /// failed seek is retried and a repeated identical seek is never
    /// silently dropped.
    async fn process_pending_seek(&mut self) {
        let Some(target) = self.pending_seek else {
            return;
        };
        let local = if self.cache.is_playing_segment {
            Some(target - self.cache.segment_start_time)
        } else if matches!(self.state, SyncState::PlayingSingle | SyncState::Idle)
            && self.loaded_path.is_some()
        {
            Some(target - self.direct_clip_start)
        } else if matches!(self.state, SyncState::Gap | SyncState::Stopped) {
            // Nothing loaded: the playhead position itself is the seek.
            None
        } else {
            // Loading or errored: retry once the region resolves.
            return;
        };
        match local {
            None => self.pending_seek = None,
            Some(ms) => match self.renderer.seek(ms_to_secs(ms.max(0))).await {
                Ok(()) => self.pending_seek = None,
                Err(e) => self.fail(e),
            },
        }
    }

    // ── Audio post-processing ───────────────────────────────────────

    /// Apply or clear renderer audio filters for the selected clip.
    ///
    /// Volume/mute and (validated) fades apply only while playing with a
    /// clip selected; otherwise any applied filters are cleared.
    async fn update_audio_filters(&mut self) {
        let clip = match (self.playing, self.selected_clip) {
            (true, Some(id)) => {
                let store = self.layout.read();
                store.find_clip(id).map(|(_, clip)| clip.clone())
            }
            _ => None,
        };
        let Some(clip) = clip else {
            if self.filters_applied {
                match self.renderer.clear_audio_filters().await {
                    Ok(()) => self.filters_applied = false,
                    Err(e) => self.fail(e),
                }
            }
            return;
        };

        let percent = clip.effective_volume() * 100.0;
        if let Err(e) = self
            .renderer
            .apply_volume_filter(percent, clip.is_muted())
            .await
        {
            self.fail(e);
            return;
        }
        if (clip.fade_in.is_some() || clip.fade_out.is_some()) && clip.fades_fit() {
            if let Err(e) = self
                .renderer
                .apply_fade_filter(
                    clip.fade_in.unwrap_or(0),
                    clip.fade_out.unwrap_or(0),
                    clip.visible_duration(),
                )
                .await
            {
                self.fail(e);
                return;
            }
        }
        self.filters_applied = true;
    }

    // ── Shared plumbing ─────────────────────────────────────────────

    /// End-of-timeline: stop playback, rewind to 0, emit completion.
    async fn finish_playback(&mut self) {
        info!(time = self.current_time, "playback reached end of timeline");
        self.playing = false;
        self.last_tick = None;
        self.pending_seek = None;
        self.generation += 1;
        self.cache = SegmentCache::default();
        if let Err(e) = self.renderer.pause().await {
            self.fail(e);
        } else {
            self.set_state(SyncState::Stopped);
        }
        self.current_time = 0;
        self.publish_time();
        self.needs_resync = true;
        self.update_audio_filters().await;
        let _ = self.events.send(PlaybackEvent::Completed);
    }

    /// Non-fatal external failure: notify, invalidate the cache, and let
    /// the next tick re-attempt classification from scratch.
    fn fail(&mut self, error: MontageError) {
        warn!(error = %error, "external command failed; reverting");
        let _ = self
            .events
            .send(PlaybackEvent::CommandFailed(error.to_string()));
        self.cache = SegmentCache::default();
        self.loaded_path = None;
        self.generation += 1;
        self.needs_resync = true;
        self.set_state(SyncState::Error);
    }

    fn set_state(&mut self, next: SyncState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "sync state transition");
            self.state = next;
            self.state_tx.send_replace(next);
        }
    }

    fn publish_time(&self) {
        self.time_tx.send_replace(self.current_time);
    }

    fn black_frame(&self) -> FrameImage {
        let (width, height) = self.frame_dimensions.unwrap_or(FALLBACK_DIMENSIONS);
        FrameImage::black(width, height)
    }

    async fn refresh_dimensions(&mut self) {
        if let Ok(dims) = self.renderer.dimensions().await {
            self.frame_dimensions = Some(dims);
        }
    }
}

/// Receive from an optional progress channel; absent means never ready.
async fn recv_progress(rx: &mut Option<mpsc::UnboundedReceiver<f32>>) -> Option<f32> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
