//! # Actions Module
//!
//! Device-control side effects triggered by the controller.
//!
//! This module handles:
//! - Rotating the default audio output device
//! - Hiding and restoring the foreground window
//! - Powering the controller off

pub mod audio;
pub mod power;
pub mod window;

pub use audio::{AudioDeviceRegistry, AudioDeviceRotator};
pub use power::PowerOffGate;
pub use window::{ToggleResult, WindowVisibilityToggle};
