//! Damped spring that chases a movable target.
//!
//! Integrated with semi-implicit Euler in fixed sub-steps so a frame hitch
//! cannot blow the simulation up.  Retargeting only changes acceleration;
//! position and velocity are never reset.

use super::geom::Vec2;

/// Largest integration step, in seconds.
const MAX_SUBSTEP: f64 = 0.004;
/// Below both of these the spring snaps exactly onto its target.
const REST_DELTA: f64 = 0.01;
const REST_SPEED: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub damping: f64,
    pub stiffness: f64,
    pub mass: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            damping: 50.0,
            stiffness: 280.0,
            mass: 1.0,
        }
    }
}

/// Two independent spring axes sharing one configuration.
#[derive(Debug, Clone)]
pub struct Spring2 {
    position: Vec2,
    /// Units per second.
    velocity: Vec2,
    target: Vec2,
    config: SpringConfig,
}

impl Spring2 {
    pub fn new(initial: Vec2, config: SpringConfig) -> Self {
        Self {
            position: initial,
            velocity: Vec2::ZERO,
            target: initial,
            config,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    #[cfg(test)]
    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Move the target without touching position or velocity.
    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    /// Teleport: position and target become `value`, velocity zero.
    pub fn jump_to(&mut self, value: Vec2) {
        self.position = value;
        self.target = value;
        self.velocity = Vec2::ZERO;
    }

    /// True once both axes rest exactly on target.
    pub fn is_at_rest(&self) -> bool {
        self.position == self.target && self.velocity == Vec2::ZERO
    }

    /// Advance by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        if !(dt > 0.0) || self.is_at_rest() {
            return;
        }
        let steps = (dt / MAX_SUBSTEP).ceil().max(1.0);
        let h = dt / steps;
        for _ in 0..steps as u32 {
            self.position.x = integrate_axis(self.position.x, &mut self.velocity.x, self.target.x, h, &self.config);
            self.position.y = integrate_axis(self.position.y, &mut self.velocity.y, self.target.y, h, &self.config);
        }
        self.settle_axes();
    }

    fn settle_axes(&mut self) {
        if (self.position.x - self.target.x).abs() < REST_DELTA && self.velocity.x.abs() < REST_SPEED {
            self.position.x = self.target.x;
            self.velocity.x = 0.0;
        }
        if (self.position.y - self.target.y).abs() < REST_DELTA && self.velocity.y.abs() < REST_SPEED {
            self.position.y = self.target.y;
            self.velocity.y = 0.0;
        }
    }
}

fn integrate_axis(x: f64, v: &mut f64, target: f64, h: f64, cfg: &SpringConfig) -> f64 {
    let spring = -cfg.stiffness * (x - target);
    let damper = -cfg.damping * *v;
    let accel = (spring + damper) / cfg.mass.max(f64::EPSILON);
    *v += accel * h;
    x + *v * h
}
