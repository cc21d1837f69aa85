//! Montage Core - Foundation types for the editing core
//!
//! This crate provides the fundamental types used throughout Montage:
//! - Millisecond time values and spans (`TimelineMs`, `TimeSpan`)
//! - Conversion to/from fractional seconds at the renderer boundary
//! - The shared error type (`MontageError`)

pub mod error;
pub mod time;

pub use error::{MontageError, Result};
pub use time::{ms_to_secs, secs_to_ms, TimeSpan, TimelineMs};
