//! # Linux Backend
//!
//! Gamepad input through evdev, synthesized input through a uinput virtual
//! device.
//!
//! ## Cursor
//!
//! uinput has no way to read or set an absolute pointer position, so the
//! injector keeps a virtual cursor and turns every `move_cursor_to` into the
//! relative motion between the old and the new position.
//!
//! ## Wheel
//!
//! Wheel deltas use the Windows unit (120 per notch). They are sent as
//! `REL_WHEEL_HI_RES` directly and accumulated into whole `REL_WHEEL`
//! notches for clients without high-resolution scrolling.
//!
//! Audio output switching, window management and controller power-off have
//! no backend here.

use std::io::Write;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key as EvKey, RelativeAxisType};
use tracing::{debug, info};

use super::{AudibleCue, Capabilities, InputInjector, Key, MouseButton};
use crate::config::Config;
use crate::controller::evdev_pad::EvdevGamepad;
use crate::error::{PadMouseError, Result};

/// Name of the virtual device as shown by `evtest` and the compositor.
pub const VIRTUAL_DEVICE_NAME: &str = "padmouse virtual input";

/// Wheel units per notch.
pub const WHEEL_NOTCH: i32 = 120;

fn key_code(key: Key) -> EvKey {
    match key {
        Key::Up => EvKey::KEY_UP,
        Key::Down => EvKey::KEY_DOWN,
        Key::Left => EvKey::KEY_LEFT,
        Key::Right => EvKey::KEY_RIGHT,
        Key::Super => EvKey::KEY_LEFTMETA,
        Key::Enter => EvKey::KEY_ENTER,
    }
}

fn button_code(button: MouseButton) -> EvKey {
    match button {
        MouseButton::Left => EvKey::BTN_LEFT,
        MouseButton::Right => EvKey::BTN_RIGHT,
        MouseButton::Middle => EvKey::BTN_MIDDLE,
    }
}

/// Splits a wheel delta into whole notches, carrying the rest in `pending`.
fn wheel_notches(pending: &mut i32, delta: i32) -> i32 {
    *pending += delta;
    let notches = *pending / WHEEL_NOTCH;
    *pending -= notches * WHEEL_NOTCH;
    notches
}

/// Relative motion events to go from `from` to `to`.
fn motion_events(from: (i32, i32), to: (i32, i32)) -> Vec<InputEvent> {
    let mut events = Vec::with_capacity(2);
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    if dx != 0 {
        events.push(InputEvent::new(
            EventType::RELATIVE,
            RelativeAxisType::REL_X.0,
            dx,
        ));
    }
    if dy != 0 {
        events.push(InputEvent::new(
            EventType::RELATIVE,
            RelativeAxisType::REL_Y.0,
            dy,
        ));
    }
    events
}

/// Keyboard and mouse injector on top of a uinput device.
pub struct UinputInjector {
    device: VirtualDevice,
    cursor: (i32, i32),
    wheel_pending: i32,
}

impl std::fmt::Debug for UinputInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UinputInjector")
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl UinputInjector {
    /// Creates the virtual keyboard/mouse.
    ///
    /// # Errors
    ///
    /// Returns `Injection` when `/dev/uinput` cannot be opened (usually a
    /// permissions problem) or the device cannot be registered.
    pub fn create() -> Result<Self> {
        let mut keys = AttributeSet::<EvKey>::new();
        for key in [Key::Up, Key::Down, Key::Left, Key::Right, Key::Super, Key::Enter] {
            keys.insert(key_code(key));
        }
        for button in [MouseButton::Left, MouseButton::Right, MouseButton::Middle] {
            keys.insert(button_code(button));
        }

        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);
        axes.insert(RelativeAxisType::REL_WHEEL);
        axes.insert(RelativeAxisType::REL_WHEEL_HI_RES);

        let uinput_err = |e: std::io::Error| {
            PadMouseError::Injection(format!("Failed to create uinput device: {}", e))
        };

        let device = VirtualDeviceBuilder::new()
            .map_err(uinput_err)?
            .name(VIRTUAL_DEVICE_NAME)
            .with_keys(&keys)
            .map_err(uinput_err)?
            .with_relative_axes(&axes)
            .map_err(uinput_err)?
            .build()
            .map_err(uinput_err)?;

        info!("Created uinput device \"{}\"", VIRTUAL_DEVICE_NAME);

        Ok(Self {
            device,
            cursor: (0, 0),
            wheel_pending: 0,
        })
    }

    fn emit(&mut self, events: &[InputEvent]) {
        if events.is_empty() {
            return;
        }
        if let Err(e) = self.device.emit(events) {
            debug!("uinput emit failed: {}", e);
        }
    }

    fn emit_key(&mut self, code: EvKey, value: i32) {
        self.emit(&[InputEvent::new(EventType::KEY, code.code(), value)]);
    }
}

impl InputInjector for UinputInjector {
    fn key_down(&mut self, key: Key) {
        self.emit_key(key_code(key), 1);
    }

    fn key_up(&mut self, key: Key) {
        self.emit_key(key_code(key), 0);
    }

    fn mouse_button_down(&mut self, button: MouseButton) {
        self.emit_key(button_code(button), 1);
    }

    fn mouse_button_up(&mut self, button: MouseButton) {
        self.emit_key(button_code(button), 0);
    }

    fn mouse_wheel(&mut self, delta: i32) {
        let mut events = vec![InputEvent::new(
            EventType::RELATIVE,
            RelativeAxisType::REL_WHEEL_HI_RES.0,
            delta,
        )];
        let notches = wheel_notches(&mut self.wheel_pending, delta);
        if notches != 0 {
            events.push(InputEvent::new(
                EventType::RELATIVE,
                RelativeAxisType::REL_WHEEL.0,
                notches,
            ));
        }
        self.emit(&events);
    }

    fn move_cursor_to(&mut self, x: i32, y: i32) {
        let events = motion_events(self.cursor, (x, y));
        self.cursor = (x, y);
        self.emit(&events);
    }

    fn cursor_position(&mut self) -> (i32, i32) {
        self.cursor
    }
}

/// Rings the terminal bell. Pitch and length are up to the terminal.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AudibleCue for TerminalBell {
    fn beep(&mut self, frequency_hz: u32, duration_ms: u32) {
        debug!("Beep {}Hz for {}ms", frequency_hz, duration_ms);
        let mut stderr = std::io::stderr();
        if let Err(e) = stderr.write_all(b"\x07").and_then(|()| stderr.flush()) {
            debug!("Terminal bell failed: {}", e);
        }
    }
}

/// Opens the evdev gamepad and the uinput injector.
///
/// # Errors
///
/// Fails when no gamepad can be opened or uinput is not accessible.
pub fn open(config: &Config) -> Result<Capabilities> {
    let gamepad = EvdevGamepad::open(&config.controller.device_path)?;
    let injector = UinputInjector::create()?;

    Ok(Capabilities {
        gamepad: Box::new(gamepad),
        injector: Box::new(injector),
        cue: Box::new(TerminalBell),
        audio: None,
        windows: None,
        power: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_has_distinct_code() {
        let keys = [Key::Up, Key::Down, Key::Left, Key::Right, Key::Super, Key::Enter];
        let mut codes: Vec<u16> = keys.iter().map(|k| key_code(*k).code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), keys.len());
    }

    #[test]
    fn test_mouse_button_codes() {
        assert_eq!(button_code(MouseButton::Left), EvKey::BTN_LEFT);
        assert_eq!(button_code(MouseButton::Right), EvKey::BTN_RIGHT);
        assert_eq!(button_code(MouseButton::Middle), EvKey::BTN_MIDDLE);
    }

    #[test]
    fn test_wheel_notches_accumulate() {
        let mut pending = 0;
        // 20 units per tick: a notch every sixth tick
        let notches: Vec<i32> = (0..12).map(|_| wheel_notches(&mut pending, 20)).collect();
        assert_eq!(notches.iter().sum::<i32>(), 2);
        assert_eq!(notches[5], 1);
        assert_eq!(notches[11], 1);
        assert_eq!(pending, 0);
    }

    #[test]
    fn test_wheel_direction_change_cancels_pending() {
        let mut pending = 0;
        assert_eq!(wheel_notches(&mut pending, 100), 0);
        assert_eq!(wheel_notches(&mut pending, -100), 0);
        assert_eq!(pending, 0);
        assert_eq!(wheel_notches(&mut pending, -240), -2);
    }

    #[test]
    fn test_motion_events_are_relative() {
        let events = motion_events((100, 100), (107, 92));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].code(), RelativeAxisType::REL_X.0);
        assert_eq!(events[0].value(), 7);
        assert_eq!(events[1].code(), RelativeAxisType::REL_Y.0);
        assert_eq!(events[1].value(), -8);
    }

    #[test]
    fn test_no_motion_emits_nothing() {
        assert!(motion_events((5, 5), (5, 5)).is_empty());
        assert_eq!(motion_events((5, 5), (5, 9)).len(), 1);
    }

    #[test]
    #[ignore] // Requires write access to /dev/uinput
    fn test_create_virtual_device() {
        let mut injector = UinputInjector::create().unwrap();
        injector.move_cursor_to(10, 10);
        assert_eq!(injector.cursor_position(), (10, 10));
    }
}
