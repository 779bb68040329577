//! Pointer velocity estimate over a short trailing window.

use std::collections::VecDeque;
use std::time::Duration;

use super::geom::Vec2;

/// Only samples this recent contribute to the release velocity.
const WINDOW: Duration = Duration::from_millis(100);

#[derive(Debug, Default, Clone)]
pub struct VelocityTracker {
    samples: VecDeque<(Duration, Vec2)>,
}

impl VelocityTracker {
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Record the pointer position at engine time `at`.
    pub fn push(&mut self, at: Duration, position: Vec2) {
        self.samples.push_back((at, position));
        while let Some(&(t, _)) = self.samples.front() {
            if at.saturating_sub(t) > WINDOW && self.samples.len() > 2 {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Velocity in px/s at time `now`.  Zero when the pointer has been still
    /// for longer than the window, or with fewer than two samples.
    pub fn velocity(&self, now: Duration) -> Vec2 {
        let Some(&(last_t, last_p)) = self.samples.back() else {
            return Vec2::ZERO;
        };
        if now.saturating_sub(last_t) > WINDOW {
            return Vec2::ZERO;
        }
        let Some(&(first_t, first_p)) = self
            .samples
            .iter()
            .find(|(t, _)| last_t.saturating_sub(*t) <= WINDOW)
        else {
            return Vec2::ZERO;
        };
        let dt = last_t.saturating_sub(first_t).as_secs_f64();
        if dt <= 0.0 {
            return Vec2::ZERO;
        }
        (last_p - first_p) / dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn steady_motion_gives_its_speed() {
        let mut t = VelocityTracker::default();
        for i in 0..=10u64 {
            t.push(ms(i * 10), Vec2::new(i as f64 * 5.0, 0.0));
        }
        let v = t.velocity(ms(100));
        assert!((v.x - 500.0).abs() < 1e-6);
        assert_eq!(v.y, 0.0);
    }

    #[test]
    fn pause_before_release_means_no_fling() {
        let mut t = VelocityTracker::default();
        t.push(ms(0), Vec2::ZERO);
        t.push(ms(16), Vec2::new(40.0, 0.0));
        assert_eq!(t.velocity(ms(300)), Vec2::ZERO);
    }

    #[test]
    fn old_samples_fall_out_of_window() {
        let mut t = VelocityTracker::default();
        t.push(ms(0), Vec2::ZERO);
        t.push(ms(500), Vec2::new(1000.0, 0.0));
        t.push(ms(550), Vec2::new(1010.0, 0.0));
        let v = t.velocity(ms(550));
        assert!((v.x - 200.0).abs() < 1e-6);
    }

    #[test]
    fn single_sample_is_zero() {
        let mut t = VelocityTracker::default();
        t.push(ms(5), Vec2::new(3.0, 3.0));
        assert_eq!(t.velocity(ms(5)), Vec2::ZERO);
        t.reset();
        assert_eq!(t.velocity(ms(5)), Vec2::ZERO);
    }
}
