//! # Controller Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - The per-tick [`InputSnapshot`] and its button bit layout
//! - Edge detection for watched button combinations
//! - Reading a Linux gamepad via evdev

pub mod edge;
#[cfg(target_os = "linux")]
pub mod evdev_pad;
pub mod snapshot;

pub use edge::{ButtonEdgeTracker, Edge, MatchPolicy, MATCH_POLICY};
pub use snapshot::{Buttons, InputSnapshot, AXIS_MAX, AXIS_MIN, TRIGGER_MAX};
