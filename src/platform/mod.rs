//! # Platform Capabilities
//!
//! Trait abstraction for everything the poll loop needs from the operating
//! system, so the mapping core can be tested without a controller or a
//! desktop session.
//!
//! Mandatory collaborators (gamepad, input injection, audible cue) are plain
//! boxed traits. Optional ones (audio endpoint switching, window management,
//! controller power-off) are `Option`s: a `None` is a steady "feature not
//! available" state, decided once at startup.

use std::fmt;

use tracing::{info, warn};

use crate::config::Config;
use crate::controller::InputSnapshot;
use crate::error::Result;

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(windows)]
pub mod win32;

/// Keyboard keys the loop can synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// Windows / launcher key.
    Super,
    Enter,
}

/// Mouse buttons the loop can synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Opaque audio render endpoint identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointId(pub String);

impl From<&str> for EndpointId {
    fn from(id: &str) -> Self {
        EndpointId(id.to_string())
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque top-level window reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Show state of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPlacement {
    Normal,
    Minimized,
    Maximized,
    /// Placement could not be queried (window gone).
    Unknown,
}

/// Source of controller snapshots. Must not block.
#[cfg_attr(test, mockall::automock)]
pub trait GamepadSource {
    fn poll(&mut self) -> Result<InputSnapshot>;
}

/// Synthesized keyboard and mouse events. Fire-and-forget.
#[cfg_attr(test, mockall::automock)]
pub trait InputInjector {
    fn key_down(&mut self, key: Key);
    fn key_up(&mut self, key: Key);
    fn mouse_button_down(&mut self, button: MouseButton);
    fn mouse_button_up(&mut self, button: MouseButton);
    /// Positive scrolls up.
    fn mouse_wheel(&mut self, delta: i32);
    fn move_cursor_to(&mut self, x: i32, y: i32);
    fn cursor_position(&mut self) -> (i32, i32);
}

/// Audio render endpoint enumeration and default selection.
#[cfg_attr(test, mockall::automock)]
pub trait AudioEndpoints {
    fn active_render_endpoints(&self) -> Result<Vec<EndpointId>>;
    fn default_render_endpoint(&self) -> Result<EndpointId>;
    fn set_default_render_endpoint(&mut self, id: &EndpointId) -> Result<()>;
}

/// Foreground window queries and show-state changes.
#[cfg_attr(test, mockall::automock)]
pub trait WindowManager {
    fn foreground_window(&self) -> Option<WindowHandle>;
    fn placement(&self, window: WindowHandle) -> WindowPlacement;
    fn minimize(&mut self, window: WindowHandle);
    fn restore(&mut self, window: WindowHandle);
}

/// Controller power-off. Returns `true` when the controller was switched off.
#[cfg_attr(test, mockall::automock)]
pub trait ControllerPower {
    fn power_off(&mut self, user_index: u32) -> bool;
}

/// Short tone used to acknowledge mode changes.
#[cfg_attr(test, mockall::automock)]
pub trait AudibleCue {
    fn beep(&mut self, frequency_hz: u32, duration_ms: u32);
}

/// Every collaborator the poll loop talks to.
pub struct Capabilities {
    pub gamepad: Box<dyn GamepadSource>,
    pub injector: Box<dyn InputInjector>,
    pub cue: Box<dyn AudibleCue>,
    pub audio: Option<Box<dyn AudioEndpoints>>,
    pub windows: Option<Box<dyn WindowManager>>,
    pub power: Option<Box<dyn ControllerPower>>,
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("audio", &self.audio.is_some())
            .field("windows", &self.windows.is_some())
            .field("power", &self.power.is_some())
            .finish_non_exhaustive()
    }
}

impl Capabilities {
    /// Logs which optional features are available. Called once at startup.
    pub fn log_availability(&self) {
        for (feature, present) in [
            ("audio output switching", self.audio.is_some()),
            ("window minimize/restore", self.windows.is_some()),
            ("controller power-off", self.power.is_some()),
        ] {
            if present {
                info!("{} enabled", feature);
            } else {
                warn!("{} unavailable on this system, feature disabled", feature);
            }
        }
    }
}

/// Opens the native backend for the current operating system.
///
/// # Errors
///
/// Fails when the gamepad or the input injection device cannot be opened.
/// Optional capabilities that fail to initialize are returned as `None`.
#[cfg(target_os = "linux")]
pub fn open(config: &Config) -> Result<Capabilities> {
    linux::open(config)
}

/// Opens the native backend for the current operating system.
///
/// # Errors
///
/// Fails when input injection cannot be set up. Optional capabilities that
/// fail to initialize are returned as `None`.
#[cfg(windows)]
pub fn open(config: &Config) -> Result<Capabilities> {
    win32::open(config)
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn open(_config: &Config) -> Result<Capabilities> {
    Err(crate::error::PadMouseError::CapabilityUnavailable(
        "no gamepad backend for this operating system".to_string(),
    ))
}


#[cfg(test)]
mod tests {
    use super::mocks::*;
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log lines in memory.
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLog {
        type Writer = CapturedLog;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_endpoint_id_from_str() {
        let id = EndpointId::from("{0.0.0.00000000}.{abc}");
        assert_eq!(id.0, "{0.0.0.00000000}.{abc}");
        assert_eq!(id.to_string(), "{0.0.0.00000000}.{abc}");
    }

    #[test]
    fn test_capabilities_debug_reports_optional_features() {
        let log = CallLog::new();
        let caps = Capabilities {
            gamepad: Box::new(ScriptedGamepad::new()),
            injector: Box::new(RecordingInjector::new(log.clone(), (0, 0))),
            cue: Box::new(RecordingCue { log: log.clone() }),
            audio: None,
            windows: None,
            power: Some(Box::new(FakePower { log, succeeds: true })),
        };

        let text = format!("{:?}", caps);
        assert!(text.contains("audio: false"));
        assert!(text.contains("power: true"));
    }

    #[test]
    fn test_log_availability_warns_once_per_missing_feature() {
        let log = CallLog::new();
        let caps = Capabilities {
            gamepad: Box::new(ScriptedGamepad::new()),
            injector: Box::new(RecordingInjector::new(log.clone(), (0, 0))),
            cue: Box::new(RecordingCue { log: log.clone() }),
            audio: None,
            windows: Some(Box::new(FakeDesktop::new(log.clone(), None))),
            power: None,
        };

        let captured = CapturedLog::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || caps.log_availability());

        let text = captured.text();
        assert_eq!(text.matches("WARN").count(), 2, "{}", text);
        assert_eq!(text.matches("audio output switching unavailable").count(), 1);
        assert_eq!(text.matches("controller power-off unavailable").count(), 1);
        assert!(text.contains("window minimize/restore enabled"));
    }

    #[test]
    fn test_scripted_gamepad_reports_disconnect_when_drained() {
        let mut pad = ScriptedGamepad::new();
        pad.push(InputSnapshot::default());

        assert!(pad.poll().is_ok());
        assert!(pad.poll().is_err());
    }

    #[test]
    fn test_recording_injector_tracks_cursor() {
        let log = CallLog::new();
        let mut injector = RecordingInjector::new(log.clone(), (10, 20));

        assert_eq!(injector.cursor_position(), (10, 20));
        injector.move_cursor_to(11, 19);
        assert_eq!(injector.cursor_position(), (11, 19));
        assert_eq!(log.calls(), vec![Call::MoveCursor(11, 19)]);
        assert!(log.actions().is_empty());
    }
}
