//! Foreground window hide/restore toggle.
//!
//! The first press force-minimizes whatever window is in the foreground and
//! remembers it. The next press restores that window if it is still
//! minimized, and forgets it either way.

use tracing::debug;

use crate::platform::{WindowHandle, WindowManager, WindowPlacement};

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleResult {
    Minimized(WindowHandle),
    Restored(WindowHandle),
    /// The stored window had already been shown again; bookkeeping cleared.
    Released(WindowHandle),
    /// No foreground window, or no window management on this system.
    Nothing,
}

pub struct WindowVisibilityToggle {
    windows: Option<Box<dyn WindowManager>>,
    hidden: Option<WindowHandle>,
}

impl std::fmt::Debug for WindowVisibilityToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowVisibilityToggle")
            .field("available", &self.windows.is_some())
            .field("hidden", &self.hidden)
            .finish()
    }
}

impl WindowVisibilityToggle {
    #[must_use]
    pub fn new(windows: Option<Box<dyn WindowManager>>) -> Self {
        Self {
            windows,
            hidden: None,
        }
    }

    /// Window minimized by the last toggle, if any.
    #[must_use]
    pub fn hidden(&self) -> Option<WindowHandle> {
        self.hidden
    }

    pub fn toggle(&mut self) -> ToggleResult {
        let Some(windows) = self.windows.as_deref_mut() else {
            return ToggleResult::Nothing;
        };

        if let Some(window) = self.hidden.take() {
            if windows.placement(window) == WindowPlacement::Minimized {
                debug!("Restoring window {:?}", window);
                windows.restore(window);
                return ToggleResult::Restored(window);
            }
            debug!("Window {:?} no longer minimized, releasing", window);
            return ToggleResult::Released(window);
        }

        match windows.foreground_window() {
            Some(window) => {
                debug!("Minimizing foreground window {:?}", window);
                windows.minimize(window);
                self.hidden = Some(window);
                ToggleResult::Minimized(window)
            }
            None => ToggleResult::Nothing,
        }
    }
}
