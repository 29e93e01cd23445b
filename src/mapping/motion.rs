//! # Cursor Motion Module
//!
//! Converts left stick readings into cursor movement.
//!
//! ## Dead Zone
//!
//! Readings with magnitude at or below the dead zone are treated as center.
//! Outside it the dead zone is subtracted while the sign is kept, so motion
//! starts from zero right at the edge instead of jumping.
//!
//! ## Speed
//!
//! `delta = speed * (|t| - dead_zone) * sign(t) / tick_rate`
//!
//! At the default tick rate of 150Hz and medium speed 0.04, a fully deflected
//! stick moves the cursor roughly 7 pixels per tick.
//!
//! ## Sub-pixel Accumulation
//!
//! Per-tick deltas are usually fractional. The fractional part left after
//! truncating the new cursor position is carried to the next tick so slow
//! stick movement still adds up to whole pixels.
//!
//! ## Usage
//!
//! ```
//! use padmouse::mapping::motion::MotionMapper;
//!
//! let mapper = MotionMapper::new(5000, 150);
//!
//! // Within dead zone
//! assert_eq!(mapper.delta(4000, 0.04), 0.0);
//!
//! // 1000 past the dead zone at 150Hz
//! assert!((mapper.delta(6000, 0.04) - 0.2667).abs() < 0.001);
//! ```

use crate::config::MotionConfig;
use crate::controller::{AXIS_MAX, AXIS_MIN};
use crate::platform::InputInjector;

/// Discrete cursor speed setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedLevel {
    /// Precision mode, toggled with the left shoulder.
    SuperLow,
    Low,
    #[default]
    Medium,
    High,
}

impl SpeedLevel {
    /// The level the precision toggle switches to.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            SpeedLevel::SuperLow => SpeedLevel::Medium,
            _ => SpeedLevel::SuperLow,
        }
    }

    /// Speed factor for this level.
    #[must_use]
    pub fn factor(self, config: &MotionConfig) -> f64 {
        match self {
            SpeedLevel::SuperLow => config.speed_super_low,
            SpeedLevel::Low => config.speed_low,
            SpeedLevel::Medium => config.speed_medium,
            SpeedLevel::High => config.speed_high,
        }
    }
}

/// Stick-to-cursor transform with a carried fractional remainder.
///
/// The remainder of each axis stays within `[-1, 1)`; it is reset only when
/// the mapper is created.
#[derive(Debug, Clone)]
pub struct MotionMapper {
    dead_zone: i32,
    tick_rate: f64,
    rest_x: f64,
    rest_y: f64,
}

impl MotionMapper {
    /// Creates a mapper for the given dead zone and loop rate.
    #[must_use]
    pub fn new(dead_zone: i32, tick_rate_hz: u32) -> Self {
        Self {
            dead_zone,
            tick_rate: f64::from(tick_rate_hz.max(1)),
            rest_x: 0.0,
            rest_y: 0.0,
        }
    }

    /// Carried fractional remainders `(x, y)`.
    #[must_use]
    pub fn remainder(&self) -> (f64, f64) {
        (self.rest_x, self.rest_y)
    }

    /// Fractional cursor delta for one axis reading.
    ///
    /// Readings outside the signed 16-bit range are wireless glitches that
    /// would fling the cursor to the screen edge; they count as center.
    #[must_use]
    pub fn delta(&self, raw: i32, speed: f64) -> f64 {
        let t = if raw > AXIS_MAX || raw < AXIS_MIN { 0 } else { raw };

        if t.abs() <= self.dead_zone {
            return 0.0;
        }

        let past_dead_zone = t.signum() * (t.abs() - self.dead_zone);
        speed * f64::from(past_dead_zone) / self.tick_rate
    }

    /// Integer cursor deltas for this tick, starting from `origin`.
    ///
    /// Stick up moves the cursor up (screen Y decreases).
    pub fn step(&mut self, origin: (i32, i32), raw_x: i32, raw_y: i32, speed: f64) -> (i32, i32) {
        let dx = self.delta(raw_x, speed);
        let dy = self.delta(raw_y, speed);

        let x = f64::from(origin.0) + self.rest_x + dx;
        let y = f64::from(origin.1) + self.rest_y - dy;

        let (whole_x, whole_y) = (x.trunc(), y.trunc());
        self.rest_x = x - whole_x;
        self.rest_y = y - whole_y;

        (whole_x as i32 - origin.0, whole_y as i32 - origin.1)
    }

    /// Reads the cursor, steps, and moves the cursor once to the new position.
    pub fn apply(&mut self, injector: &mut dyn InputInjector, raw_x: i32, raw_y: i32, speed: f64) {
        let origin = injector.cursor_position();
        let (dx, dy) = self.step(origin, raw_x, raw_y, speed);
        injector.move_cursor_to(origin.0 + dx, origin.1 + dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockInputInjector;
    use mockall::predicate::eq;

    const DEAD_ZONE: i32 = 5000;
    const RATE: u32 = 150;
    const SPEED: f64 = 0.04;
    const EPS: f64 = 1e-9;

    #[test]
    fn test_delta_zero_at_center() {
        let mapper = MotionMapper::new(DEAD_ZONE, RATE);
        assert_eq!(mapper.delta(0, SPEED), 0.0);
    }

    #[test]
    fn test_delta_zero_within_dead_zone() {
        let mapper = MotionMapper::new(DEAD_ZONE, RATE);
        assert_eq!(mapper.delta(DEAD_ZONE, SPEED), 0.0);
        assert_eq!(mapper.delta(-DEAD_ZONE, SPEED), 0.0);
        assert_eq!(mapper.delta(2500, SPEED), 0.0);
    }

    #[test]
    fn test_delta_linear_past_dead_zone() {
        let mapper = MotionMapper::new(DEAD_ZONE, RATE);
        for k in [1, 100, 1000, 27767] {
            let expected = SPEED * f64::from(k) / f64::from(RATE);
            assert!((mapper.delta(DEAD_ZONE + k, SPEED) - expected).abs() < EPS);
        }
    }

    #[test]
    fn test_delta_odd_symmetric() {
        let mapper = MotionMapper::new(DEAD_ZONE, RATE);
        for t in [5001, 6000, 12345, 32767] {
            assert_eq!(mapper.delta(-t, SPEED), -mapper.delta(t, SPEED));
        }
    }

    #[test]
    fn test_delta_discards_out_of_range_glitch() {
        let mapper = MotionMapper::new(DEAD_ZONE, RATE);
        assert_eq!(mapper.delta(AXIS_MAX + 1, SPEED), 0.0);
        assert_eq!(mapper.delta(AXIS_MIN - 1, SPEED), 0.0);
        assert_eq!(mapper.delta(i32::MAX, SPEED), 0.0);
        // The extremes themselves are genuine full deflection
        assert!(mapper.delta(AXIS_MAX, SPEED) > 0.0);
        assert!(mapper.delta(AXIS_MIN, SPEED) < 0.0);
    }

    #[test]
    fn test_delta_scales_with_speed() {
        let mapper = MotionMapper::new(DEAD_ZONE, RATE);
        let slow = mapper.delta(20000, 0.008);
        let fast = mapper.delta(20000, 0.04);
        assert!((fast - slow * 5.0).abs() < EPS);
    }

    #[test]
    fn test_sub_pixel_motion_accumulates() {
        let mut mapper = MotionMapper::new(DEAD_ZONE, RATE);
        let mut cursor = (100, 100);
        let mut total = 0;

        // 0.2667 px per tick: three ticks stay put, the fourth moves one pixel
        for tick in 1..=4 {
            let (dx, dy) = mapper.step(cursor, 6000, 0, SPEED);
            assert_eq!(dy, 0);
            if tick < 4 {
                assert_eq!(dx, 0, "tick {} should not move yet", tick);
            }
            cursor.0 += dx;
            total += dx;
        }

        assert_eq!(total, 1);
        let (rest_x, _) = mapper.remainder();
        assert!((rest_x - (4.0 * 0.04 * 1000.0 / 150.0 - 1.0)).abs() < 1e-6);
        assert!((rest_x - 0.0667).abs() < 1e-3);
    }

    #[test]
    fn test_y_axis_inverted() {
        let mut mapper = MotionMapper::new(DEAD_ZONE, RATE);
        // Full up deflection: cursor moves up the screen
        let (_, dy) = mapper.step((500, 500), 0, 32767, SPEED);
        assert!(dy < 0);

        let mut mapper = MotionMapper::new(DEAD_ZONE, RATE);
        let (_, dy) = mapper.step((500, 500), 0, -32768, SPEED);
        assert!(dy > 0);
    }

    #[test]
    fn test_remainder_bounded_and_motion_conserved() {
        let mut mapper = MotionMapper::new(DEAD_ZONE, RATE);
        let mut cursor = (300, 300);
        let (mut emitted_x, mut emitted_y) = (0i64, 0i64);
        let (mut raw_x_sum, mut raw_y_sum) = (0.0f64, 0.0f64);

        let inputs = [
            (6000, -7000),
            (-32768, 9000),
            (12000, 12000),
            (0, -32768),
            (-5500, 5500),
            (32767, -20000),
            (-15000, 0),
        ];

        for round in 0..50 {
            for &(rx, ry) in &inputs {
                let speed = if round % 2 == 0 { SPEED } else { 0.072 };
                raw_x_sum += mapper.delta(rx, speed);
                raw_y_sum -= mapper.delta(ry, speed);

                let (dx, dy) = mapper.step(cursor, rx, ry, speed);
                cursor = (cursor.0 + dx, cursor.1 + dy);
                emitted_x += i64::from(dx);
                emitted_y += i64::from(dy);

                let (rest_x, rest_y) = mapper.remainder();
                assert!((-1.0..1.0).contains(&rest_x), "x remainder {}", rest_x);
                assert!((-1.0..1.0).contains(&rest_y), "y remainder {}", rest_y);
            }
        }

        let (rest_x, rest_y) = mapper.remainder();
        assert!((emitted_x as f64 + rest_x - raw_x_sum).abs() < 1e-6);
        assert!((emitted_y as f64 + rest_y - raw_y_sum).abs() < 1e-6);
    }

    #[test]
    fn test_remainder_bounded_at_negative_coordinates() {
        let mut mapper = MotionMapper::new(DEAD_ZONE, RATE);
        let mut cursor = (-1920, -5);
        for _ in 0..200 {
            let (dx, dy) = mapper.step(cursor, -9000, 9000, SPEED);
            cursor = (cursor.0 + dx, cursor.1 + dy);
            let (rest_x, rest_y) = mapper.remainder();
            assert!((-1.0..1.0).contains(&rest_x));
            assert!((-1.0..1.0).contains(&rest_y));
        }
        assert!(cursor.0 < -1920);
        assert!(cursor.1 < -5);
    }

    #[test]
    fn test_apply_moves_cursor_once() {
        let mut mapper = MotionMapper::new(DEAD_ZONE, RATE);
        let mut injector = MockInputInjector::new();

        injector
            .expect_cursor_position()
            .times(1)
            .return_const((200, 200));
        // 27767 past the dead zone = ~7.4px right and ~7.4px up, truncated
        injector
            .expect_move_cursor_to()
            .with(eq(207), eq(192))
            .times(1)
            .return_const(());

        mapper.apply(&mut injector, 32767, 32767, SPEED);
    }

    #[test]
    fn test_speed_level_toggle() {
        assert_eq!(SpeedLevel::default(), SpeedLevel::Medium);
        assert_eq!(SpeedLevel::Medium.toggled(), SpeedLevel::SuperLow);
        assert_eq!(SpeedLevel::SuperLow.toggled(), SpeedLevel::Medium);
        assert_eq!(SpeedLevel::High.toggled(), SpeedLevel::SuperLow);
        assert_eq!(SpeedLevel::Low.toggled(), SpeedLevel::SuperLow);
    }

    #[test]
    fn test_speed_level_factor() {
        let config = MotionConfig::default();
        assert_eq!(SpeedLevel::SuperLow.factor(&config), 0.008);
        assert_eq!(SpeedLevel::Low.factor(&config), 0.032);
        assert_eq!(SpeedLevel::Medium.factor(&config), 0.04);
        assert_eq!(SpeedLevel::High.factor(&config), 0.072);
    }
}
