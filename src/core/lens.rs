//! Fisheye lens model and entrance stagger.
//!
//! Everything here is a pure function of geometry (and, for the entrance,
//! elapsed time).  No hidden state.

use std::time::Duration;

use super::geom::Vec2;

pub const DEFAULT_LENS_RADIUS: f64 = 0.55;

/// Entrance stagger spans `delay_factor * STAGGER` before a tile starts.
const STAGGER: f64 = 0.5;
const ENTRANCE_DURATION: f64 = 0.7;
const ENTRANCE_START_SCALE: f64 = 0.2;
/// After this long, every tile is drawn fully revealed.
pub const ENTRANCE_WINDOW: Duration = Duration::from_secs(2);

/// Visual parameters derived from a tile's distance to the viewport centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensParams {
    /// 0 at the centre, 1 at (and beyond) the lens radius.
    pub distance_factor: f64,
    /// Unclamped `distance / max_distance`; drives stagger only.
    pub delay_factor: f64,
    pub scale: f64,
    pub opacity: f64,
    pub blur: f64,
    pub z_index: i32,
}

impl LensParams {
    pub fn compute(
        tile_center: Vec2,
        viewport_center: Vec2,
        max_distance: f64,
        lens_radius: f64,
    ) -> Self {
        let distance = tile_center.distance(viewport_center);
        let falloff = max_distance * lens_radius;

        let distance_factor = if falloff > 0.0 {
            (distance / falloff).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let delay_factor = if max_distance > 0.0 {
            distance / max_distance
        } else {
            0.0
        };

        Self::from_factors(distance_factor, delay_factor)
    }

    pub fn from_factors(distance_factor: f64, delay_factor: f64) -> Self {
        let df = distance_factor;
        Self {
            distance_factor: df,
            delay_factor,
            scale: 1.22 - 0.42 * df,
            opacity: 1.0 - 0.30 * df,
            blur: 1.2 * df,
            z_index: (100.0 - 50.0 * df).round() as i32,
        }
    }
}

/// Distance from the viewport centre to a corner.
pub fn max_possible_distance(viewport: Vec2) -> f64 {
    viewport.half().length()
}

/// Reveal progress of one tile during the entrance window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entrance {
    pub scale: f64,
    pub opacity: f64,
}

impl Entrance {
    pub const DONE: Entrance = Entrance {
        scale: 1.0,
        opacity: 1.0,
    };

    /// Staggered expo-out reveal: tiles near the centre start first.
    pub fn at(delay_factor: f64, since_start: Duration) -> Self {
        if since_start >= ENTRANCE_WINDOW {
            return Self::DONE;
        }
        let delay = delay_factor.max(0.0) * STAGGER;
        let t = ((since_start.as_secs_f64() - delay) / ENTRANCE_DURATION).clamp(0.0, 1.0);
        let eased = ease_out_expo(t);
        Self {
            scale: ENTRANCE_START_SCALE + (1.0 - ENTRANCE_START_SCALE) * eased,
            opacity: eased,
        }
    }
}

fn ease_out_expo(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2f64.powf(-10.0 * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(1200.0, 800.0);

    fn at_distance(d: f64) -> LensParams {
        let center = VIEWPORT.half();
        LensParams::compute(
            center + Vec2::new(d, 0.0),
            center,
            max_possible_distance(VIEWPORT),
            DEFAULT_LENS_RADIUS,
        )
    }

    #[test]
    fn centre_tile_is_full_size() {
        let p = at_distance(0.0);
        assert_eq!(p.distance_factor, 0.0);
        assert!((p.scale - 1.22).abs() < 1e-12);
        assert_eq!(p.opacity, 1.0);
        assert_eq!(p.blur, 0.0);
        assert_eq!(p.z_index, 100);
    }

    #[test]
    fn far_tile_is_fully_attenuated() {
        let max = max_possible_distance(VIEWPORT);
        let p = at_distance(max);
        assert_eq!(p.distance_factor, 1.0);
        assert!((p.delay_factor - 1.0).abs() < 1e-12);
        assert!((p.scale - 0.80).abs() < 1e-12);
        assert!((p.opacity - 0.70).abs() < 1e-12);
        assert!((p.blur - 1.2).abs() < 1e-12);
        assert_eq!(p.z_index, 50);
    }

    #[test]
    fn lens_radius_sets_full_attenuation_point() {
        let max = max_possible_distance(VIEWPORT);
        let p = at_distance(max * 0.55);
        assert!((p.distance_factor - 1.0).abs() < 1e-12);
        assert!((p.delay_factor - 0.55).abs() < 1e-12);
        let half = at_distance(max * 0.275);
        assert!((half.distance_factor - 0.5).abs() < 1e-12);
        assert_eq!(half.z_index, 75);
    }

    #[test]
    fn lens_is_monotonic_in_distance() {
        let max = max_possible_distance(VIEWPORT);
        let mut prev = at_distance(0.0);
        for step in 1..=200 {
            let p = at_distance(max * step as f64 / 200.0);
            assert!(p.scale <= prev.scale);
            assert!(p.opacity <= prev.opacity);
            assert!(p.blur >= prev.blur);
            assert!(p.z_index <= prev.z_index);
            prev = p;
        }
    }

    #[test]
    fn zero_max_distance_does_not_divide_by_zero() {
        let p = LensParams::compute(Vec2::new(3.0, 4.0), Vec2::ZERO, 0.0, DEFAULT_LENS_RADIUS);
        assert_eq!(p.distance_factor, 0.0);
        assert_eq!(p.delay_factor, 0.0);
    }

    #[test]
    fn entrance_staggers_by_distance() {
        let t = Duration::from_millis(300);
        let near = Entrance::at(0.0, t);
        let far = Entrance::at(1.0, t);
        assert!(near.opacity > far.opacity);
        assert_eq!(far.opacity, 0.0);
        assert!((far.scale - ENTRANCE_START_SCALE).abs() < 1e-12);
        assert_eq!(Entrance::at(1.0, Duration::from_millis(1300)), Entrance::DONE);
        assert_eq!(Entrance::at(0.3, ENTRANCE_WINDOW), Entrance::DONE);
    }
}
