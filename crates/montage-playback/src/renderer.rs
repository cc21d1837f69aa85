//! Renderer command surface.
//!
//! The external media engine loads one file at a time and reports/controls
//! its play position. Commands are async and fallible; the trait spells out
//! `Send` futures so the synchronizer task can issue them freely.
//!
//! Positions cross this boundary in fractional seconds; everything else in
//! the core is integer milliseconds.

use std::future::Future;

use montage_core::{Result, TimelineMs};

/// A captured or synthesized RGBA8 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixel data, row-major
    pub data: Vec<u8>,
}

impl FrameImage {
    /// Synthesize an all-black frame (painted during gaps).
    pub fn black(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width * height * 4) as usize],
        }
    }
}

/// Command surface of the external frame-accurate media renderer.
pub trait Renderer: Send + Sync {
    /// Load a media file, replacing whatever is currently loaded.
    fn load(&self, file_path: &str) -> impl Future<Output = Result<()>> + Send;

    /// Resume playback of the loaded file.
    fn play(&self) -> impl Future<Output = Result<()>> + Send;

    /// Pause playback.
    fn pause(&self) -> impl Future<Output = Result<()>> + Send;

    /// Seek within the loaded file, in seconds.
    fn seek(&self, seconds: f64) -> impl Future<Output = Result<()>> + Send;

    /// Current play position within the loaded file, in seconds.
    fn time(&self) -> impl Future<Output = Result<f64>> + Send;

    /// Duration of the loaded file, in seconds.
    fn duration(&self) -> impl Future<Output = Result<f64>> + Send;

    /// Pixel dimensions of the loaded file.
    fn dimensions(&self) -> impl Future<Output = Result<(u32, u32)>> + Send;

    /// Capture the current frame's pixel data.
    fn capture_frame(&self) -> impl Future<Output = Result<FrameImage>> + Send;

    /// Apply a volume filter: `percent` in 0-200, plus a mute flag.
    fn apply_volume_filter(&self, percent: f64, muted: bool)
        -> impl Future<Output = Result<()>> + Send;

    /// Apply linear fade filters over the clip's visible duration.
    fn apply_fade_filter(
        &self,
        fade_in_ms: TimelineMs,
        fade_out_ms: TimelineMs,
        clip_duration_ms: TimelineMs,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove all audio filters.
    fn clear_audio_filters(&self) -> impl Future<Output = Result<()>> + Send;
}
