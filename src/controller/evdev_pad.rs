//! # evdev Gamepad Module
//!
//! Polls a Linux gamepad through the evdev interface and converts its state
//! into an XInput-shaped [`InputSnapshot`].
//!
//! ## Controller Detection
//!
//! Either the configured `device_path` is opened, or `/dev/input/event*` is
//! scanned in order for the first device that reports both a south face
//! button and a left stick X axis.
//!
//! ## Polling
//!
//! The current key and axis state is queried with ioctls on every tick
//! instead of reading the event stream, so polling never blocks and a tick
//! always sees the latest state.
//!
//! ## Axis Layout (Linux gamepad API)
//!
//! | Axis | evdev Code | Snapshot Field |
//! |------|------------|----------------|
//! | Left Stick X | ABS_X | `left_stick_x` |
//! | Left Stick Y | ABS_Y (down positive) | `left_stick_y` (up positive) |
//! | Right Stick X | ABS_RX | `right_stick_x` |
//! | Right Stick Y | ABS_RY (down positive) | `right_stick_y` (up positive) |
//! | Left Trigger | ABS_Z | `left_trigger` |
//! | Right Trigger | ABS_RZ | `right_trigger` |
//! | D-Pad | ABS_HAT0X / ABS_HAT0Y or BTN_DPAD_* | d-pad bits |

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::Path;
use tracing::{debug, info};

use super::snapshot::{Buttons, InputSnapshot, AXIS_MAX, AXIS_MIN};
use crate::error::{PadMouseError, Result};
use crate::platform::GamepadSource;

/// Face, shoulder, stick and system buttons with their XInput bit.
const BUTTON_MAP: [(Key, Buttons); 14] = [
    (Key::BTN_SOUTH, Buttons::A),
    (Key::BTN_EAST, Buttons::B),
    (Key::BTN_WEST, Buttons::X),
    (Key::BTN_NORTH, Buttons::Y),
    (Key::BTN_TL, Buttons::LEFT_SHOULDER),
    (Key::BTN_TR, Buttons::RIGHT_SHOULDER),
    (Key::BTN_SELECT, Buttons::BACK),
    (Key::BTN_START, Buttons::START),
    (Key::BTN_THUMBL, Buttons::LEFT_THUMB),
    (Key::BTN_THUMBR, Buttons::RIGHT_THUMB),
    (Key::BTN_DPAD_UP, Buttons::DPAD_UP),
    (Key::BTN_DPAD_DOWN, Buttons::DPAD_DOWN),
    (Key::BTN_DPAD_LEFT, Buttons::DPAD_LEFT),
    (Key::BTN_DPAD_RIGHT, Buttons::DPAD_RIGHT),
];

/// One axis reading with the range the driver reports for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisReading {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
}

/// Rescales a stick reading onto the signed 16-bit range.
///
/// Readings outside the reported range are scaled along with it, so a glitch
/// stays out of range and is discarded later by the motion mapper.
#[must_use]
pub fn normalize_stick(reading: AxisReading) -> i32 {
    if reading.maximum <= reading.minimum {
        return 0;
    }
    let span = f64::from(reading.maximum) - f64::from(reading.minimum);
    let t = (f64::from(reading.value) - f64::from(reading.minimum)) / span;
    (t * 65535.0 - 32768.0).round() as i32
}

/// Rescales a trigger reading onto 0-255.
#[must_use]
pub fn normalize_trigger(reading: AxisReading) -> u8 {
    if reading.maximum <= reading.minimum {
        return 0;
    }
    let span = f64::from(reading.maximum) - f64::from(reading.minimum);
    let t = (f64::from(reading.value) - f64::from(reading.minimum)) / span;
    (t * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Flips a stick axis (evdev Y grows downwards, snapshot Y grows upwards).
#[must_use]
pub fn invert_stick(value: i32) -> i32 {
    if value == AXIS_MIN {
        AXIS_MAX
    } else {
        -value
    }
}

/// Builds a snapshot from pressed keys and axis readings.
///
/// Kept free of any device handle so it can be exercised directly.
pub fn build_snapshot<P, A>(pressed: P, axis: A) -> InputSnapshot
where
    P: Fn(Key) -> bool,
    A: Fn(AbsoluteAxisType) -> Option<AxisReading>,
{
    let mut buttons = Buttons::NONE;
    for (key, bit) in BUTTON_MAP {
        if pressed(key) {
            buttons = buttons | bit;
        }
    }

    // Hat-style d-pads (xpad, hid-playstation)
    match axis(AbsoluteAxisType::ABS_HAT0X).map(|r| r.value.signum()) {
        Some(-1) => buttons = buttons | Buttons::DPAD_LEFT,
        Some(1) => buttons = buttons | Buttons::DPAD_RIGHT,
        _ => {}
    }
    match axis(AbsoluteAxisType::ABS_HAT0Y).map(|r| r.value.signum()) {
        Some(-1) => buttons = buttons | Buttons::DPAD_UP,
        Some(1) => buttons = buttons | Buttons::DPAD_DOWN,
        _ => {}
    }

    let stick = |code| axis(code).map_or(0, normalize_stick);
    let trigger = |code| axis(code).map_or(0, normalize_trigger);

    InputSnapshot {
        buttons,
        left_stick_x: stick(AbsoluteAxisType::ABS_X),
        left_stick_y: invert_stick(stick(AbsoluteAxisType::ABS_Y)),
        right_stick_x: stick(AbsoluteAxisType::ABS_RX),
        right_stick_y: invert_stick(stick(AbsoluteAxisType::ABS_RY)),
        left_trigger: trigger(AbsoluteAxisType::ABS_Z),
        right_trigger: trigger(AbsoluteAxisType::ABS_RZ),
    }
}

/// evdev gamepad handle
///
/// Represents an open gamepad event device polled once per tick.
pub struct EvdevGamepad {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for EvdevGamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevGamepad")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl EvdevGamepad {
    /// Open the configured device, or the first gamepad found.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: No gamepad found on the system
    /// - `Controller`: The configured path could not be opened
    pub fn open(device_path: &str) -> Result<Self> {
        if device_path.is_empty() {
            return Self::detect();
        }

        let device = Device::open(device_path).map_err(|e| {
            PadMouseError::Controller(format!("Failed to open {}: {}", device_path, e))
        })?;
        info!(
            "Opened gamepad {} at {}",
            device.name().unwrap_or("(unnamed)"),
            device_path
        );

        Ok(Self {
            device,
            device_path: device_path.to_string(),
        })
    }

    /// Scan `/dev/input` for the first device that looks like a gamepad
    fn detect() -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(PadMouseError::Controller(
                "/dev/input directory not found".to_string(),
            ));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| PadMouseError::Controller(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                PadMouseError::Controller(format!("Failed to read directory entry: {}", e))
            })?;

        // Sort entries for deterministic device selection when multiple controllers are connected
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            match path.file_name() {
                Some(name) if name.to_string_lossy().starts_with("event") => {}
                _ => continue,
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("(unnamed)")
                    );

                    if Self::is_gamepad(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!(
                            "Found gamepad {} at {}",
                            device.name().unwrap_or("(unnamed)"),
                            device_path
                        );
                        return Ok(Self {
                            device,
                            device_path,
                        });
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(PadMouseError::ControllerNotFound)
    }

    fn is_gamepad(device: &Device) -> bool {
        let has_face_button = device
            .supported_keys()
            .map_or(false, |keys| keys.contains(Key::BTN_SOUTH));
        let has_stick = device
            .supported_absolute_axes()
            .map_or(false, |axes| axes.contains(AbsoluteAxisType::ABS_X));
        has_face_button && has_stick
    }

    /// Device path this gamepad was opened from
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

impl GamepadSource for EvdevGamepad {
    fn poll(&mut self) -> Result<InputSnapshot> {
        let keys = self
            .device
            .get_key_state()
            .map_err(|e| PadMouseError::Controller(format!("Failed to read keys: {}", e)))?;
        let abs = self
            .device
            .get_abs_state()
            .map_err(|e| PadMouseError::Controller(format!("Failed to read axes: {}", e)))?;
        let supported = self.device.supported_absolute_axes();

        Ok(build_snapshot(
            |key| keys.contains(key),
            |code| {
                if !supported.map_or(false, |axes| axes.contains(code)) {
                    return None;
                }
                abs.get(code.0 as usize).map(|info| AxisReading {
                    value: info.value,
                    minimum: info.minimum,
                    maximum: info.maximum,
                })
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XPAD_STICK: (i32, i32) = (-32768, 32767);
    const BYTE_RANGE: (i32, i32) = (0, 255);

    fn reading(value: i32, range: (i32, i32)) -> AxisReading {
        AxisReading {
            value,
            minimum: range.0,
            maximum: range.1,
        }
    }

    #[test]
    fn test_normalize_stick_identity_for_16bit_range() {
        assert_eq!(normalize_stick(reading(-32768, XPAD_STICK)), -32768);
        assert_eq!(normalize_stick(reading(0, XPAD_STICK)), 0);
        assert_eq!(normalize_stick(reading(32767, XPAD_STICK)), 32767);
        assert_eq!(normalize_stick(reading(12000, XPAD_STICK)), 12000);
    }

    #[test]
    fn test_normalize_stick_byte_range() {
        assert_eq!(normalize_stick(reading(0, BYTE_RANGE)), -32768);
        assert_eq!(normalize_stick(reading(255, BYTE_RANGE)), 32767);
        // Byte-range center lands well inside any sensible dead zone
        assert!(normalize_stick(reading(128, BYTE_RANGE)).abs() < 300);
    }

    #[test]
    fn test_normalize_stick_glitch_stays_out_of_range() {
        assert!(normalize_stick(reading(300, BYTE_RANGE)) > AXIS_MAX);
        assert!(normalize_stick(reading(-40, BYTE_RANGE)) < AXIS_MIN);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        assert_eq!(normalize_stick(reading(5, (0, 0))), 0);
        assert_eq!(normalize_trigger(reading(5, (10, 10))), 0);
    }

    #[test]
    fn test_normalize_trigger() {
        assert_eq!(normalize_trigger(reading(0, BYTE_RANGE)), 0);
        assert_eq!(normalize_trigger(reading(255, BYTE_RANGE)), 255);
        assert_eq!(normalize_trigger(reading(1023, (0, 1023))), 255);
        assert_eq!(normalize_trigger(reading(2000, (0, 1023))), 255);
    }

    #[test]
    fn test_invert_stick() {
        assert_eq!(invert_stick(1000), -1000);
        assert_eq!(invert_stick(0), 0);
        assert_eq!(invert_stick(AXIS_MAX), -AXIS_MAX);
        assert_eq!(invert_stick(AXIS_MIN), AXIS_MAX);
    }

    #[test]
    fn test_build_snapshot_buttons() {
        let snapshot = build_snapshot(
            |key| key == Key::BTN_SOUTH || key == Key::BTN_TL,
            |_| None,
        );
        assert_eq!(snapshot.buttons, Buttons::A | Buttons::LEFT_SHOULDER);
    }

    #[test]
    fn test_build_snapshot_hat_dpad() {
        let snapshot = build_snapshot(
            |_| false,
            |code| match code {
                AbsoluteAxisType::ABS_HAT0X => Some(reading(1, (-1, 1))),
                AbsoluteAxisType::ABS_HAT0Y => Some(reading(-1, (-1, 1))),
                _ => None,
            },
        );
        assert_eq!(snapshot.buttons, Buttons::DPAD_RIGHT | Buttons::DPAD_UP);
    }

    #[test]
    fn test_build_snapshot_axes() {
        let snapshot = build_snapshot(
            |_| false,
            |code| match code {
                AbsoluteAxisType::ABS_X => Some(reading(8000, XPAD_STICK)),
                // Stick pushed up: evdev reports negative Y
                AbsoluteAxisType::ABS_Y => Some(reading(-9000, XPAD_STICK)),
                AbsoluteAxisType::ABS_RY => Some(reading(20000, XPAD_STICK)),
                AbsoluteAxisType::ABS_RZ => Some(reading(255, BYTE_RANGE)),
                _ => None,
            },
        );
        assert_eq!(snapshot.left_stick_x, 8000);
        assert_eq!(snapshot.left_stick_y, 9000);
        assert_eq!(snapshot.right_stick_x, 0);
        assert_eq!(snapshot.right_stick_y, -20000);
        assert_eq!(snapshot.left_trigger, 0);
        assert_eq!(snapshot.right_trigger, 255);
    }

    #[test]
    fn test_build_snapshot_idle() {
        let snapshot = build_snapshot(|_| false, |_| None);
        assert_eq!(snapshot, InputSnapshot::default());
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_poll_with_real_hardware() {
        let mut pad = EvdevGamepad::open("").expect("Gamepad not found");
        assert!(pad.device_path().starts_with("/dev/input/event"));
        assert!(pad.poll().is_ok());
    }
}
