//! # Input Snapshot Module
//!
//! One tick's raw controller reading, laid out like an XInput gamepad report.
//!
//! ## Button Bits
//!
//! | Button | Bit |
//! |--------|-----|
//! | D-Pad Up | 0x0001 |
//! | D-Pad Down | 0x0002 |
//! | D-Pad Left | 0x0004 |
//! | D-Pad Right | 0x0008 |
//! | Start | 0x0010 |
//! | Back | 0x0020 |
//! | Left Thumb | 0x0040 |
//! | Right Thumb | 0x0080 |
//! | Left Shoulder | 0x0100 |
//! | Right Shoulder | 0x0200 |
//! | A | 0x1000 |
//! | B | 0x2000 |
//! | X | 0x4000 |
//! | Y | 0x8000 |
//!
//! ## Axes
//!
//! Sticks are nominally signed 16-bit (up and right are positive), triggers are
//! 0-255. Stick readings are carried as `i32` so that out-of-range glitches from
//! a backend survive until the motion mapper discards them.

use std::fmt;
use std::ops::BitOr;

/// Largest valid stick reading.
pub const AXIS_MAX: i32 = i16::MAX as i32;
/// Smallest valid stick reading.
pub const AXIS_MIN: i32 = i16::MIN as i32;
/// Trigger reading at full press.
pub const TRIGGER_MAX: u8 = u8::MAX;

/// Raw button-state value with bitmask semantics.
///
/// Combinations are built with `|`:
///
/// ```
/// use padmouse::controller::Buttons;
///
/// let combo = Buttons::BACK | Buttons::START;
/// assert_eq!(combo.bits(), 0x0030);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Buttons(u16);

impl Buttons {
    pub const NONE: Buttons = Buttons(0);
    pub const DPAD_UP: Buttons = Buttons(0x0001);
    pub const DPAD_DOWN: Buttons = Buttons(0x0002);
    pub const DPAD_LEFT: Buttons = Buttons(0x0004);
    pub const DPAD_RIGHT: Buttons = Buttons(0x0008);
    pub const START: Buttons = Buttons(0x0010);
    pub const BACK: Buttons = Buttons(0x0020);
    pub const LEFT_THUMB: Buttons = Buttons(0x0040);
    pub const RIGHT_THUMB: Buttons = Buttons(0x0080);
    pub const LEFT_SHOULDER: Buttons = Buttons(0x0100);
    pub const RIGHT_SHOULDER: Buttons = Buttons(0x0200);
    pub const A: Buttons = Buttons(0x1000);
    pub const B: Buttons = Buttons(0x2000);
    pub const X: Buttons = Buttons(0x4000);
    pub const Y: Buttons = Buttons(0x8000);

    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Buttons(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True when every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Buttons) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Buttons {
    type Output = Buttons;

    fn bitor(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 | rhs.0)
    }
}

impl fmt::Display for Buttons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// One polled controller reading.
///
/// Produced fresh each tick and never retained past it.
///
/// # Examples
///
/// ```
/// use padmouse::controller::{Buttons, InputSnapshot};
///
/// let snapshot = InputSnapshot::default();
/// assert_eq!(snapshot.buttons, Buttons::NONE);
/// assert_eq!(snapshot.left_stick_x, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputSnapshot {
    /// Pressed buttons.
    pub buttons: Buttons,

    /// Left stick X axis (cursor). Negative = left.
    pub left_stick_x: i32,
    /// Left stick Y axis (cursor). Negative = down.
    pub left_stick_y: i32,
    /// Right stick X axis (unused).
    pub right_stick_x: i32,
    /// Right stick Y axis (wheel). Negative = down.
    pub right_stick_y: i32,

    /// Left trigger, 0 = released.
    pub left_trigger: u8,
    /// Right trigger (power off), 255 = fully pressed.
    pub right_trigger: u8,
}

impl InputSnapshot {
    /// A neutral reading carrying only the given buttons.
    #[must_use]
    pub fn with_buttons(buttons: Buttons) -> Self {
        Self {
            buttons,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_bits_match_xinput_layout() {
        assert_eq!(Buttons::DPAD_UP.bits(), 0x0001);
        assert_eq!(Buttons::DPAD_RIGHT.bits(), 0x0008);
        assert_eq!(Buttons::START.bits(), 0x0010);
        assert_eq!(Buttons::BACK.bits(), 0x0020);
        assert_eq!(Buttons::LEFT_SHOULDER.bits(), 0x0100);
        assert_eq!(Buttons::RIGHT_SHOULDER.bits(), 0x0200);
        assert_eq!(Buttons::A.bits(), 0x1000);
        assert_eq!(Buttons::Y.bits(), 0x8000);
    }

    #[test]
    fn test_combination_contains() {
        let combo = Buttons::BACK | Buttons::START;
        assert!(combo.contains(Buttons::BACK));
        assert!(combo.contains(Buttons::START));
        assert!(!combo.contains(Buttons::A));
        assert!(!Buttons::BACK.contains(combo));
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!((Buttons::A | Buttons::B).to_string(), "0x3000");
    }

    #[test]
    fn test_default_snapshot_is_neutral() {
        let snapshot = InputSnapshot::default();
        assert!(snapshot.buttons.is_empty());
        assert_eq!(snapshot.left_stick_y, 0);
        assert_eq!(snapshot.right_stick_y, 0);
        assert_eq!(snapshot.right_trigger, 0);
    }

    #[test]
    fn test_with_buttons() {
        let snapshot = InputSnapshot::with_buttons(Buttons::Y);
        assert_eq!(snapshot.buttons, Buttons::Y);
        assert_eq!(snapshot.left_stick_x, 0);
    }

    #[test]
    fn test_axis_constants() {
        assert_eq!(AXIS_MAX, 32767);
        assert_eq!(AXIS_MIN, -32768);
        assert_eq!(TRIGGER_MAX, 255);
    }
}
