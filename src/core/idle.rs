//! Idle demo drift: a slow diamond around the resting offset that hints the
//! grid can be dragged.  Runs until cancelled; cancelling hands back the
//! offset it started from.

use std::time::Duration;

use super::geom::Vec2;

const PERIOD: f64 = 4.0;
const AMPLITUDE: f64 = 120.0;
const TIMES: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];
const KEYS_X: [f64; 6] = [0.0, 1.0, 0.0, -1.0, 0.0, 0.0];
const KEYS_Y: [f64; 6] = [0.0, 0.0, 1.0, 0.0, -1.0, 0.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleDrift {
    /// Offset before the drift started; restored on cancel.
    center: Vec2,
    started_at: Duration,
}

impl IdleDrift {
    pub fn start(center: Vec2, now: Duration) -> Self {
        Self {
            center,
            started_at: now,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Raw offset the drift wants at engine time `now`.
    pub fn offset_at(&self, now: Duration) -> Vec2 {
        let elapsed = now.saturating_sub(self.started_at).as_secs_f64();
        let phase = (elapsed / PERIOD).fract();
        self.center + Vec2::new(sample(&KEYS_X, phase), sample(&KEYS_Y, phase)) * AMPLITUDE
    }
}

/// Piecewise keyframe interpolation with ease-in-out per segment.
fn sample(keys: &[f64; 6], phase: f64) -> f64 {
    let seg = TIMES
        .windows(2)
        .position(|w| phase >= w[0] && phase < w[1])
        .unwrap_or(TIMES.len() - 2);
    let (t0, t1) = (TIMES[seg], TIMES[seg + 1]);
    let local = ((phase - t0) / (t1 - t0)).clamp(0.0, 1.0);
    let eased = ease_in_out(local);
    keys[seg] + (keys[seg + 1] - keys[seg]) * eased
}

fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn traces_a_diamond_through_keyframes() {
        let c = Vec2::new(10.0, 20.0);
        let drift = IdleDrift::start(c, secs(1.0));
        let at = |t: f64| drift.offset_at(secs(1.0 + t));

        assert_eq!(at(0.0), c);
        assert!((at(0.8) - (c + Vec2::new(120.0, 0.0))).length() < 1e-9);
        assert!((at(1.6) - (c + Vec2::new(0.0, 120.0))).length() < 1e-9);
        assert!((at(2.4) - (c + Vec2::new(-120.0, 0.0))).length() < 1e-9);
        assert!((at(3.2) - (c + Vec2::new(0.0, -120.0))).length() < 1e-9);
    }

    #[test]
    fn repeats_every_period() {
        let drift = IdleDrift::start(Vec2::ZERO, Duration::ZERO);
        let a = drift.offset_at(secs(0.5));
        let b = drift.offset_at(secs(4.5));
        assert!((a - b).length() < 1e-9);
    }

    #[test]
    fn stays_within_amplitude() {
        let drift = IdleDrift::start(Vec2::ZERO, Duration::ZERO);
        for i in 0..400 {
            let p = drift.offset_at(secs(i as f64 * 0.01));
            assert!(p.x.abs() <= AMPLITUDE + 1e-9 && p.y.abs() <= AMPLITUDE + 1e-9);
        }
    }

    #[test]
    fn easing_hits_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-12);
    }
}
