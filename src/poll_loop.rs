//! # Poll Loop
//!
//! Fixed-rate loop that turns each controller snapshot into keyboard and
//! mouse events.
//!
//! ## Tick Order
//!
//! 1. Disable combination (Back+Start) toggles the disabled mode
//! 2. Disabled mode or a controller power-off ends the tick
//! 3. Cursor motion, scrolling, audio output rotation
//! 4. Mouse buttons, d-pad arrows, window toggle, launcher and enter keys
//! 5. Precision speed toggle
//!
//! Gating always runs before any mapping, so a power-off press on the same
//! tick as stick movement suppresses that movement.
//!
//! ## Bindings
//!
//! | Button | Action |
//! |--------|--------|
//! | Back + Start | Enable / disable |
//! | Left stick | Cursor |
//! | Right stick Y | Wheel |
//! | A / X / Left Thumb | Left / right / middle click |
//! | D-Pad | Arrow keys |
//! | Y | Minimize / restore foreground window |
//! | Start | Super key |
//! | B | Enter |
//! | Right Shoulder | Next audio output |
//! | Left Shoulder | Precision speed toggle |
//! | Right Trigger (full) | Power off controller |

use std::future::Future;

use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::actions::{AudioDeviceRotator, PowerOffGate, WindowVisibilityToggle};
use crate::config::{Config, CueConfig, MotionConfig};
use crate::controller::{ButtonEdgeTracker, Buttons, InputSnapshot};
use crate::mapping::{MotionMapper, ScrollMapper, SpeedLevel};
use crate::platform::{AudibleCue, Capabilities, GamepadSource, InputInjector, Key, MouseButton};

/// Combination that enables and disables all mapping.
pub const DISABLE_COMBO: Buttons =
    Buttons::from_bits(Buttons::BACK.bits() | Buttons::START.bits());

const CLICK_BINDINGS: [(Buttons, MouseButton); 3] = [
    (Buttons::A, MouseButton::Left),
    (Buttons::X, MouseButton::Right),
    (Buttons::LEFT_THUMB, MouseButton::Middle),
];

const ARROW_BINDINGS: [(Buttons, Key); 4] = [
    (Buttons::DPAD_UP, Key::Up),
    (Buttons::DPAD_DOWN, Key::Down),
    (Buttons::DPAD_LEFT, Key::Left),
    (Buttons::DPAD_RIGHT, Key::Right),
];

const WINDOW_TOGGLE: Buttons = Buttons::Y;
const AUDIO_ROTATE: Buttons = Buttons::RIGHT_SHOULDER;
const SPEED_TOGGLE: Buttons = Buttons::LEFT_SHOULDER;
const LAUNCHER_BINDING: (Buttons, Key) = (Buttons::START, Key::Super);
const CONFIRM_BINDING: (Buttons, Key) = (Buttons::B, Key::Enter);

/// Number of ticks between status log messages
const STATUS_INTERVAL_TICKS: u64 = 1500;

/// User-selected modes, changed only by button presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeFlags {
    pub disabled: bool,
    pub speed: SpeedLevel,
}

/// How far a tick got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Mapping is disabled; only the disable combination was checked.
    Disabled,
    /// The controller was switched off; nothing else ran.
    PoweredOff,
    /// All mappings ran.
    Mapped,
}

/// Owns every component and all mutable mapping state.
pub struct PollLoop {
    gamepad: Box<dyn GamepadSource>,
    injector: Box<dyn InputInjector>,
    cue: Box<dyn AudibleCue>,
    edges: ButtonEdgeTracker,
    motion: MotionMapper,
    scroll: ScrollMapper,
    audio: AudioDeviceRotator,
    window: WindowVisibilityToggle,
    power: PowerOffGate,
    mode: ModeFlags,
    speeds: MotionConfig,
    cues: CueConfig,
    period: Duration,
    ticks: u64,
}

impl std::fmt::Debug for PollLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollLoop")
            .field("mode", &self.mode)
            .field("ticks", &self.ticks)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

impl PollLoop {
    /// Builds the loop and its components. Enumerates audio outputs once.
    pub fn new(config: &Config, caps: Capabilities) -> Self {
        let Capabilities {
            gamepad,
            injector,
            cue,
            audio,
            windows,
            power,
        } = caps;

        Self {
            gamepad,
            injector,
            cue,
            edges: ButtonEdgeTracker::new(),
            motion: MotionMapper::new(config.motion.dead_zone, config.timing.tick_rate_hz),
            scroll: ScrollMapper::new(config.scroll.dead_zone, config.scroll.speed),
            audio: AudioDeviceRotator::initialize(audio),
            window: WindowVisibilityToggle::new(windows),
            power: PowerOffGate::new(power, config.controller.user_index, &config.cues),
            mode: ModeFlags::default(),
            speeds: config.motion.clone(),
            cues: config.cues.clone(),
            period: Duration::from_millis(config.timing.period_ms()),
            ticks: 0,
        }
    }

    #[must_use]
    pub fn mode(&self) -> ModeFlags {
        self.mode
    }

    /// Ticks processed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn window(&self) -> &WindowVisibilityToggle {
        &self.window
    }

    #[must_use]
    pub fn audio(&self) -> &AudioDeviceRotator {
        &self.audio
    }

    /// Reads the controller. A failed read counts as a neutral controller.
    pub fn poll(&mut self) -> InputSnapshot {
        match self.gamepad.poll() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Controller read failed: {}", e);
                InputSnapshot::default()
            }
        }
    }

    /// Runs one tick against `snapshot`.
    pub fn tick(&mut self, snapshot: &InputSnapshot) -> TickOutcome {
        self.ticks += 1;

        if self.edges.observe(snapshot, DISABLE_COMBO).down {
            self.mode.disabled = !self.mode.disabled;
            let hz = if self.mode.disabled {
                info!("Mapping disabled");
                self.cues.disable_hz
            } else {
                info!("Mapping enabled");
                self.cues.enable_hz
            };
            self.cue.beep(hz, self.cues.duration_ms);
        }

        if self.mode.disabled {
            return TickOutcome::Disabled;
        }
        if self.power.check(snapshot, self.cue.as_mut()) {
            return TickOutcome::PoweredOff;
        }

        let speed = self.mode.speed.factor(&self.speeds);
        self.motion.apply(
            self.injector.as_mut(),
            snapshot.left_stick_x,
            snapshot.left_stick_y,
            speed,
        );
        self.scroll.apply(self.injector.as_mut(), snapshot.right_stick_y);

        if self.edges.observe(snapshot, AUDIO_ROTATE).down {
            match self.audio.rotate() {
                Ok(Some(index)) => info!("Audio output switched to device {}", index),
                Ok(None) => debug!("No audio outputs to rotate through"),
                Err(e) => debug!("Audio output switch failed: {}", e),
            }
        }

        for (button, mouse) in CLICK_BINDINGS {
            self.map_click(snapshot, button, mouse);
        }
        for (button, key) in ARROW_BINDINGS {
            self.map_key(snapshot, button, key);
        }

        if self.edges.observe(snapshot, WINDOW_TOGGLE).down {
            let result = self.window.toggle();
            debug!("Window toggle: {:?}", result);
        }

        self.map_key(snapshot, LAUNCHER_BINDING.0, LAUNCHER_BINDING.1);
        self.map_key(snapshot, CONFIRM_BINDING.0, CONFIRM_BINDING.1);

        if self.edges.observe(snapshot, SPEED_TOGGLE).down {
            self.mode.speed = self.mode.speed.toggled();
            info!("Cursor speed: {:?}", self.mode.speed);
        }

        TickOutcome::Mapped
    }

    fn map_click(&mut self, snapshot: &InputSnapshot, button: Buttons, mouse: MouseButton) {
        let edge = self.edges.observe(snapshot, button);
        if edge.down {
            self.injector.mouse_button_down(mouse);
        }
        if edge.up {
            self.injector.mouse_button_up(mouse);
        }
    }

    fn map_key(&mut self, snapshot: &InputSnapshot, button: Buttons, key: Key) {
        let edge = self.edges.observe(snapshot, button);
        if edge.down {
            self.injector.key_down(key);
        }
        if edge.up {
            self.injector.key_up(key);
        }
    }

    /// Runs until Ctrl+C.
    pub async fn run(&mut self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C, shutting down...");
        })
        .await;
    }

    /// Ticks at the configured rate until `shutdown` completes.
    ///
    /// A tick that overruns its period delays the following ones instead of
    /// bursting to catch up.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("Polling controller every {}ms", self.period.as_millis());
        info!("Press Ctrl+C to exit");

        let mut last_status = self.ticks;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = self.poll();
                    self.tick(&snapshot);

                    if self.ticks - last_status >= STATUS_INTERVAL_TICKS {
                        debug!(
                            "{} ticks, disabled: {}, speed: {:?}",
                            self.ticks, self.mode.disabled, self.mode.speed
                        );
                        last_status = self.ticks;
                    }
                }

                () = &mut shutdown => {
                    break;
                }
            }
        }

        info!("Total ticks: {}", self.ticks);
    }
}
