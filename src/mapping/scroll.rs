//! # Scroll Module
//!
//! Right stick Y to mouse wheel. Unlike buttons this is level-triggered: a
//! wheel event is emitted on every tick the stick is held past the dead zone,
//! which gives continuous scrolling.

use crate::platform::InputInjector;

/// One tick's wheel movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollEvent {
    Up(u32),
    Down(u32),
}

impl ScrollEvent {
    /// Signed wheel delta, positive scrolls up.
    #[must_use]
    pub fn wheel_delta(self) -> i32 {
        match self {
            ScrollEvent::Up(amount) => amount as i32,
            ScrollEvent::Down(amount) => -(amount as i32),
        }
    }
}

/// Stick-to-wheel threshold with its own (larger) dead zone.
#[derive(Debug, Clone, Copy)]
pub struct ScrollMapper {
    dead_zone: i32,
    speed: u32,
}

impl ScrollMapper {
    #[must_use]
    pub fn new(dead_zone: i32, speed: u32) -> Self {
        Self { dead_zone, speed }
    }

    #[must_use]
    pub fn step(&self, raw_y: i32) -> Option<ScrollEvent> {
        if raw_y > self.dead_zone {
            Some(ScrollEvent::Up(self.speed))
        } else if raw_y < -self.dead_zone {
            Some(ScrollEvent::Down(self.speed))
        } else {
            None
        }
    }

    /// Emits this tick's wheel event, if any.
    pub fn apply(&self, injector: &mut dyn InputInjector, raw_y: i32) {
        if let Some(event) = self.step(raw_y) {
            injector.mouse_wheel(event.wheel_delta());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockInputInjector;
    use mockall::predicate::eq;

    #[test]
    fn test_center_and_dead_zone_are_quiet() {
        let mapper = ScrollMapper::new(7000, 20);
        assert_eq!(mapper.step(0), None);
        assert_eq!(mapper.step(7000), None);
        assert_eq!(mapper.step(-7000), None);
        // Past the cursor dead zone but not the scroll one
        assert_eq!(mapper.step(6000), None);
    }

    #[test]
    fn test_scroll_directions() {
        let mapper = ScrollMapper::new(7000, 20);
        assert_eq!(mapper.step(7001), Some(ScrollEvent::Up(20)));
        assert_eq!(mapper.step(-7001), Some(ScrollEvent::Down(20)));
        assert_eq!(mapper.step(32767), Some(ScrollEvent::Up(20)));
        assert_eq!(mapper.step(-32768), Some(ScrollEvent::Down(20)));
    }

    #[test]
    fn test_wheel_delta_sign() {
        assert_eq!(ScrollEvent::Up(20).wheel_delta(), 20);
        assert_eq!(ScrollEvent::Down(20).wheel_delta(), -20);
    }

    #[test]
    fn test_held_stick_repeats_every_tick() {
        let mapper = ScrollMapper::new(7000, 20);
        let mut injector = MockInputInjector::new();
        injector
            .expect_mouse_wheel()
            .with(eq(-20))
            .times(5)
            .return_const(());

        for _ in 0..5 {
            mapper.apply(&mut injector, -15000);
        }
    }

    #[test]
    fn test_apply_idle_stick_emits_nothing() {
        let mapper = ScrollMapper::new(7000, 20);
        let mut injector = MockInputInjector::new();
        injector.expect_mouse_wheel().never();

        mapper.apply(&mut injector, 300);
    }
}
