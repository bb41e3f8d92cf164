//! Single-car circuit race around the origin.
//!
//! The track is implicit: laps are counted by accumulating the signed change
//! of the car's polar angle around the origin, so any closed loop that
//! encloses the centre counts, in either direction.

use crate::error::RaceError;
use crate::input::{DriveControls, KeySet};
use crate::math::{
    elapsed_seconds, ensure_finite_motion, laps_from_angle, polar_angle, validate_tick, wrap_angle,
};
use crate::{
    Race, BASE_SPEED, CIRCUIT_START, COAST_DECAY, DEFAULT_TOTAL_LAPS, REVERSE_FACTOR, TURN_SPEED,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircuitConfig {
    pub total_laps: i32,
    /// Speed the car snaps to while the forward control is held.
    pub base_speed: f32,
    /// Steering rate in radians per second.
    pub turn_speed: f32,
    /// Per-tick speed multiplier while coasting.
    pub coast_decay: f32,
    /// Reverse speed as a fraction of `base_speed`.
    pub reverse_factor: f32,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            total_laps: DEFAULT_TOTAL_LAPS,
            base_speed: BASE_SPEED,
            turn_speed: TURN_SPEED,
            coast_decay: COAST_DECAY,
            reverse_factor: REVERSE_FACTOR,
        }
    }
}

impl CircuitConfig {
    pub fn with_laps(total_laps: i32) -> Self {
        Self {
            total_laps,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), RaceError> {
        if self.total_laps < 0 {
            return Err(RaceError::InvalidConfiguration(format!(
                "total laps must not be negative, got {}",
                self.total_laps
            )));
        }
        let tuning = [
            ("base speed", self.base_speed),
            ("turn speed", self.turn_speed),
            ("coast decay", self.coast_decay),
            ("reverse factor", self.reverse_factor),
        ];
        for (name, value) in tuning {
            if !value.is_finite() || value < 0.0 {
                return Err(RaceError::InvalidConfiguration(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        // Coasting must never speed the car up.
        if self.coast_decay > 1.0 {
            return Err(RaceError::InvalidConfiguration(format!(
                "coast decay must be in [0, 1], got {}",
                self.coast_decay
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitRace {
    config: CircuitConfig,
    x: f32,
    y: f32,
    z: f32,
    heading: f32,
    speed: f32,
    lap: u32,
    total_laps: u32,
    last_angle: f32,
    total_angle: f32,
    started: bool,
    completed: bool,
    start_time: f64,
    current_time: f64,
}

impl CircuitRace {
    pub fn new(config: CircuitConfig) -> Result<Self, RaceError> {
        config.validate()?;
        let (x, y, z) = CIRCUIT_START;
        Ok(Self {
            config,
            x,
            y,
            z,
            heading: 0.0,
            speed: 0.0,
            lap: 0,
            total_laps: config.total_laps as u32,
            last_angle: 0.0,
            total_angle: 0.0,
            started: false,
            completed: false,
            start_time: 0.0,
            current_time: 0.0,
        })
    }

    pub fn with_laps(total_laps: i32) -> Result<Self, RaceError> {
        Self::new(CircuitConfig::with_laps(total_laps))
    }

    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn z(&self) -> f32 {
        self.z
    }

    pub fn position(&self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn lap(&self) -> u32 {
        self.lap
    }

    pub fn total_laps(&self) -> u32 {
        self.total_laps
    }

    pub fn total_angle(&self) -> f32 {
        self.total_angle
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    fn apply_speed(&mut self, controls: &DriveControls) {
        if controls.forward {
            self.speed = self.config.base_speed;
        } else if controls.backward {
            self.speed = -self.config.reverse_factor * self.config.base_speed;
        } else {
            self.speed *= self.config.coast_decay;
        }
    }

    fn apply_steering(&mut self, controls: &DriveControls, delta: f32) {
        if controls.left {
            self.heading += self.config.turn_speed * delta;
        }
        if controls.right {
            self.heading -= self.config.turn_speed * delta;
        }
    }

    fn integrate_position(&mut self, delta: f32) {
        // Heading 0 faces +z.
        let distance = self.speed * delta;
        self.x += self.heading.sin() * distance;
        self.z += self.heading.cos() * distance;
    }

    fn count_laps(&mut self) {
        let current_angle = polar_angle(self.x, self.z);
        self.total_angle += wrap_angle(current_angle - self.last_angle);
        self.last_angle = current_angle;

        let laps = laps_from_angle(self.total_angle);
        if laps > self.lap {
            self.lap = laps;
            info!("Lap {} of {} completed", self.lap, self.total_laps);
        }

        if self.lap >= self.total_laps {
            self.completed = true;
            info!("Circuit race completed in {:.2}s", self.current_time);
        }
    }
}

impl Race for CircuitRace {
    fn start(&mut self, now: f64) {
        self.started = true;
        self.start_time = now;
        self.last_angle = polar_angle(self.x, self.z);
        self.total_angle = 0.0;
        debug!("Circuit race started at {}", now);
    }

    fn update(&mut self, delta: f32, now: f64, keys: &KeySet) -> Result<(), RaceError> {
        validate_tick(delta, now)?;
        if !self.started || self.completed {
            return Ok(());
        }

        let controls = DriveControls::resolve(keys);
        let mut next = self.clone();
        next.apply_speed(&controls);
        next.apply_steering(&controls, delta);
        next.integrate_position(delta);
        ensure_finite_motion(&[next.x, next.z, next.heading, next.speed])?;

        next.current_time = elapsed_seconds(next.start_time, now);
        next.count_laps();
        *self = next;
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn is_completed(&self) -> bool {
        self.completed
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }
}
