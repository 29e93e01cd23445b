//! # Audio Output Rotation
//!
//! Cycles the system default playback device through the active render
//! endpoints, one step per press.
//!
//! The registry is captured once at startup. Switching is best-effort and
//! forward-only: the index advances before the OS call, is not rolled back
//! if the call fails, and the next press simply tries the following device.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::platform::{AudioEndpoints, EndpointId};

/// Ordered endpoint list plus the current selection.
///
/// `index` is always a valid position, or the list is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioDeviceRegistry {
    pub endpoints: Vec<EndpointId>,
    pub index: usize,
}

impl AudioDeviceRegistry {
    /// Builds a registry positioned on `current`, or on the first endpoint
    /// when `current` is unknown or absent.
    #[must_use]
    pub fn new(endpoints: Vec<EndpointId>, current: Option<&EndpointId>) -> Self {
        let index = current
            .and_then(|id| endpoints.iter().position(|e| e == id))
            .unwrap_or(0);
        Self { endpoints, index }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    #[must_use]
    pub fn current(&self) -> Option<&EndpointId> {
        self.endpoints.get(self.index)
    }

    /// Moves to the next endpoint, wrapping around. No-op when empty.
    pub fn advance(&mut self) -> Option<&EndpointId> {
        if self.endpoints.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.endpoints.len();
        self.endpoints.get(self.index)
    }
}

/// Rotates the default render endpoint.
pub struct AudioDeviceRotator {
    endpoints: Option<Box<dyn AudioEndpoints>>,
    registry: AudioDeviceRegistry,
}

impl std::fmt::Debug for AudioDeviceRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDeviceRotator")
            .field("available", &self.endpoints.is_some())
            .field("registry", &self.registry)
            .finish()
    }
}

impl AudioDeviceRotator {
    /// Enumerates active render endpoints and locates the current default.
    ///
    /// A failed enumeration leaves the registry empty; a failed default
    /// lookup starts the rotation from the first endpoint.
    pub fn initialize(endpoints: Option<Box<dyn AudioEndpoints>>) -> Self {
        let registry = match endpoints.as_deref() {
            Some(caps) => match caps.active_render_endpoints() {
                Ok(list) => {
                    let current = caps
                        .default_render_endpoint()
                        .map_err(|e| debug!("No default render endpoint: {}", e))
                        .ok();
                    AudioDeviceRegistry::new(list, current.as_ref())
                }
                Err(e) => {
                    warn!("Failed to enumerate audio outputs: {}", e);
                    AudioDeviceRegistry::default()
                }
            },
            None => AudioDeviceRegistry::default(),
        };

        if !registry.is_empty() {
            info!(
                "Found {} audio output(s), current: {}",
                registry.endpoints.len(),
                registry.current().map_or("-".to_string(), ToString::to_string)
            );
        }

        Self {
            endpoints,
            registry,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &AudioDeviceRegistry {
        &self.registry
    }

    /// Switches to the next endpoint.
    ///
    /// Returns the new index, or `None` when rotation is unavailable (no
    /// endpoints or no audio capability), in which case nothing changes.
    ///
    /// # Errors
    ///
    /// Returns the OS failure of the switch; the index has already advanced.
    pub fn rotate(&mut self) -> Result<Option<usize>> {
        let Some(endpoints) = self.endpoints.as_deref_mut() else {
            return Ok(None);
        };
        let Some(next) = self.registry.advance() else {
            return Ok(None);
        };

        debug!("Switching audio output to {}", next);
        endpoints.set_default_render_endpoint(next)?;
        Ok(Some(self.registry.index))
    }
}
