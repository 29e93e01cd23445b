//! # Mapping Module
//!
//! Analog stick to pointer mapping.
//!
//! This module handles:
//! - Left stick to cursor motion with dead zone, speed levels and sub-pixel carry
//! - Right stick to continuous wheel scrolling

pub mod motion;
pub mod scroll;

pub use motion::{MotionMapper, SpeedLevel};
pub use scroll::{ScrollEvent, ScrollMapper};
