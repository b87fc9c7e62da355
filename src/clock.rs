//! Simulated time: an accumulating clock that runs at an adjustable speed.

use chrono::{DateTime, Datelike, Utc};

const MS_PER_DAY: f64 = 86_400_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;

/// Speed presets bound to the number keys (1-5)
pub const SPEED_PRESETS: [f64; 5] = [1.0, 60.0, 600.0, 3600.0, 86_400.0];

/// Absolute point in time, milliseconds since the Unix epoch.
///
/// Kept as `f64` so fractional milliseconds accumulate across frames at
/// low speed multipliers.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Instant {
    pub millis: f64,
}

impl Instant {
    pub fn from_millis(millis: f64) -> Self {
        Self { millis }
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::from_millis(dt.timestamp_millis() as f64)
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Whole-millisecond UTC datetime, `None` outside chrono's range
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        if !self.millis.is_finite() {
            return None;
        }
        DateTime::from_timestamp_millis(self.millis.floor() as i64)
    }

    /// Fractional hours since UTC midnight, in [0, 24)
    pub fn utc_hours(self) -> f64 {
        self.millis.rem_euclid(MS_PER_DAY) / MS_PER_HOUR
    }

    /// 1-based day of the UTC year
    pub fn day_of_year(self) -> u32 {
        self.to_datetime().map(|dt| dt.ordinal()).unwrap_or(1)
    }
}

/// Wall-clock time in milliseconds since the epoch. Not monotonic; use
/// `FrameTimer` for frame deltas.
pub fn wall_clock_ms() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1000.0
}

/// Monotonic milliseconds since the view started, for frame deltas and
/// cosmetic animation
#[derive(Debug, Clone, Copy)]
pub struct FrameTimer {
    started: std::time::Instant,
}

impl FrameTimer {
    pub fn start() -> Self {
        Self { started: std::time::Instant::now() }
    }

    pub fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

/// The single simulated clock, written only by the render loop.
#[derive(Debug, Clone)]
pub struct SimClock {
    simulated_time_ms: f64,
    speed: f64,
    last_frame_real_ms: Option<f64>,
}

impl SimClock {
    /// Clock starting at the current wall-clock time, running at 1x
    pub fn new() -> Self {
        Self::starting_at(Instant::from_millis(wall_clock_ms()))
    }

    pub fn starting_at(start: Instant) -> Self {
        debug_assert!(start.millis.is_finite(), "start instant must be finite");
        Self {
            simulated_time_ms: start.millis,
            speed: 1.0,
            last_frame_real_ms: None,
        }
    }

    pub fn now(&self) -> Instant {
        Instant::from_millis(self.simulated_time_ms)
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Move simulated time forward by `real_elapsed_ms × speed`
    pub fn advance(&mut self, real_elapsed_ms: f64) -> Instant {
        self.simulated_time_ms += real_elapsed_ms * self.speed;
        self.now()
    }

    /// Advance by the real time elapsed since the previous frame.
    /// The first call only records the frame time. A frame time earlier
    /// than the previous one counts as no elapsed time.
    pub fn tick(&mut self, real_now_ms: f64) -> Instant {
        let elapsed = self
            .last_frame_real_ms
            .map(|last| (real_now_ms - last).max(0.0))
            .unwrap_or(0.0);
        self.last_frame_real_ms = Some(real_now_ms);
        self.advance(elapsed)
    }

    /// Record a frame without advancing simulated time
    pub fn mark_frame(&mut self, real_now_ms: f64) {
        self.last_frame_real_ms = Some(real_now_ms);
    }

    /// Any finite multiplier: negative rewinds, zero freezes
    pub fn set_speed(&mut self, multiplier: f64) {
        debug_assert!(multiplier.is_finite(), "speed multiplier must be finite");
        self.speed = multiplier;
    }

    /// Flip between forward and reverse at the current magnitude
    pub fn reverse(&mut self) {
        self.speed = -self.speed;
    }

    /// Jump back to wall-clock time at 1x
    pub fn reset(&mut self) {
        self.reset_to(wall_clock_ms());
    }

    /// Set simulated time to `epoch_ms` at 1x. Frame timing is untouched,
    /// so the next tick still measures from the previous frame.
    pub fn reset_to(&mut self, epoch_ms: f64) {
        self.simulated_time_ms = epoch_ms;
        self.speed = 1.0;
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Short label for a speed multiplier: "1x", "-3600x", "paused"
pub fn speed_label(speed: f64) -> String {
    if speed == 0.0 {
        "paused".to_string()
    } else if speed.fract() == 0.0 {
        format!("{}x", speed as i64)
    } else {
        format!("{:.2}x", speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn advance_scales_by_speed() {
        let mut clock = SimClock::starting_at(Instant::from_millis(1_000_000.0));
        clock.set_speed(2.0);
        let t = clock.advance(1000.0);
        assert_eq!(t.millis, 1_002_000.0);
    }

    #[test]
    fn negative_speed_rewinds_and_zero_freezes() {
        let mut clock = SimClock::starting_at(Instant::from_millis(50_000.0));
        clock.set_speed(-10.0);
        assert_eq!(clock.advance(1000.0).millis, 40_000.0);
        clock.set_speed(0.0);
        assert_eq!(clock.advance(5000.0).millis, 40_000.0);
    }

    #[test]
    fn reset_restores_real_time_and_unit_speed() {
        let mut clock = SimClock::starting_at(Instant::from_millis(0.0));
        clock.set_speed(3600.0);
        clock.advance(10_000.0);
        clock.reset();
        assert_eq!(clock.speed(), 1.0);
        let drift = (clock.now().millis - wall_clock_ms()).abs();
        assert!(drift < 1000.0, "reset drifted {drift} ms from wall clock");
    }

    #[test]
    fn tick_uses_delta_between_frames() {
        let mut clock = SimClock::starting_at(Instant::from_millis(0.0));
        clock.set_speed(10.0);
        assert_eq!(clock.tick(5_000.0).millis, 0.0);
        assert_eq!(clock.tick(5_100.0).millis, 1_000.0);
    }

    #[test]
    fn backwards_frame_time_never_rewinds() {
        let mut clock = SimClock::starting_at(Instant::from_millis(0.0));
        clock.set_speed(3600.0);
        clock.tick(10_000.0);
        assert_eq!(clock.tick(9_000.0).millis, 0.0);
        // deltas resume from the latest frame time
        assert_eq!(clock.tick(9_010.0).millis, 36_000.0);
    }

    #[test]
    fn reset_keeps_frame_timing() {
        let mut clock = SimClock::starting_at(Instant::from_millis(0.0));
        clock.tick(1_000.0);
        clock.reset_to(5_000_000.0);
        assert_eq!(clock.tick(1_500.0).millis, 5_000_500.0);
    }

    #[test]
    fn frame_timer_is_monotonic() {
        let timer = FrameTimer::start();
        let a = timer.now_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = timer.now_ms();
        assert!(a >= 0.0 && b >= a + 4.0, "{a} -> {b}");
    }

    #[test]
    fn mark_frame_does_not_advance() {
        let mut clock = SimClock::starting_at(Instant::from_millis(0.0));
        clock.set_speed(100.0);
        clock.tick(0.0);
        clock.mark_frame(60_000.0);
        assert_eq!(clock.now().millis, 0.0);
        assert_eq!(clock.tick(60_010.0).millis, 1_000.0);
    }

    #[test]
    fn reverse_flips_sign() {
        let mut clock = SimClock::starting_at(Instant::from_millis(0.0));
        clock.set_speed(60.0);
        clock.reverse();
        assert_eq!(clock.speed(), -60.0);
    }

    #[test]
    fn instant_calendar_helpers() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 0).unwrap();
        let t = Instant::from_datetime(dt);
        assert!((t.utc_hours() - 18.5).abs() < 1e-9);
        assert_eq!(t.day_of_year(), 61);
        assert_eq!(t.to_datetime(), Some(dt));
    }

    #[test]
    fn utc_hours_before_epoch_stays_in_range() {
        let t = Instant::from_millis(-MS_PER_HOUR);
        assert!((t.utc_hours() - 23.0).abs() < 1e-9);
    }

    #[test]
    fn speed_labels() {
        assert_eq!(speed_label(1.0), "1x");
        assert_eq!(speed_label(-3600.0), "-3600x");
        assert_eq!(speed_label(0.0), "paused");
        assert_eq!(speed_label(0.5), "0.50x");
    }
}
