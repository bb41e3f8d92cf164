//! Two-lane drag race along the x axis.

use crate::error::RaceError;
use crate::input::{
    KeySet, PedalControls, RACER_A_ACCELERATE, RACER_A_BRAKE, RACER_B_ACCELERATE, RACER_B_BRAKE,
};
use crate::math::{elapsed_seconds, ensure_finite_motion, validate_tick};
use crate::{
    Race, DRAG_ACCELERATION, DRAG_BRAKE_FACTOR, DRAG_FRICTION, DRAG_LANE_A_Z, DRAG_LANE_B_Z,
    DRAG_MAX_SPEED, DRAG_START_X, FINISH_LINE_X, RIDE_HEIGHT,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Outcome of a drag race. The integer codes are what clients receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Winner {
    #[default]
    None,
    A,
    B,
    Draw,
}

impl Winner {
    pub fn code(self) -> u8 {
        match self {
            Winner::None => 0,
            Winner::A => 1,
            Winner::B => 2,
            Winner::Draw => 3,
        }
    }
}

/// How to settle both racers crossing on the same tick with identical x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TieBreak {
    #[default]
    Draw,
    FirstRacer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragConfig {
    pub acceleration: f32,
    /// Braking deceleration as a multiple of `acceleration`.
    pub brake_factor: f32,
    pub max_speed: f32,
    /// Applied to speed every tick, even under throttle.
    pub friction: f32,
    pub finish_line_x: f32,
    pub tie_break: TieBreak,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            acceleration: DRAG_ACCELERATION,
            brake_factor: DRAG_BRAKE_FACTOR,
            max_speed: DRAG_MAX_SPEED,
            friction: DRAG_FRICTION,
            finish_line_x: FINISH_LINE_X,
            tie_break: TieBreak::default(),
        }
    }
}

impl DragConfig {
    pub fn validate(&self) -> Result<(), RaceError> {
        if !self.max_speed.is_finite() || self.max_speed <= 0.0 {
            return Err(RaceError::InvalidConfiguration(format!(
                "max speed must be positive, got {}",
                self.max_speed
            )));
        }
        if !(self.friction > 0.0 && self.friction <= 1.0) {
            return Err(RaceError::InvalidConfiguration(format!(
                "friction must be in (0, 1], got {}",
                self.friction
            )));
        }
        for (name, value) in [
            ("acceleration", self.acceleration),
            ("brake factor", self.brake_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RaceError::InvalidConfiguration(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !self.finish_line_x.is_finite() {
            return Err(RaceError::InvalidConfiguration(format!(
                "finish line {} is not finite",
                self.finish_line_x
            )));
        }
        Ok(())
    }
}

/// One car on the strip. Only `x` and `speed` change during a race.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Racer {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub heading: f32,
    pub speed: f32,
}

impl Racer {
    pub fn new(z: f32) -> Self {
        Self {
            x: DRAG_START_X,
            y: RIDE_HEIGHT,
            z,
            heading: 0.0,
            speed: 0.0,
        }
    }

    pub fn position(&self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }

    fn drive(&mut self, pedals: PedalControls, config: &DragConfig, delta: f32) {
        if pedals.accelerate {
            self.speed += config.acceleration * delta;
        } else if pedals.brake {
            self.speed -= config.acceleration * config.brake_factor * delta;
        }
        self.speed = self.speed.clamp(0.0, config.max_speed);
        self.speed *= config.friction;
        self.x += self.speed * delta;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragRace {
    config: DragConfig,
    racer_a: Racer,
    racer_b: Racer,
    started: bool,
    completed: bool,
    winner: Winner,
    start_time: f64,
    current_time: f64,
}

impl Default for DragRace {
    fn default() -> Self {
        Self::from_valid(DragConfig::default())
    }
}

impl DragRace {
    pub fn new(config: DragConfig) -> Result<Self, RaceError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: DragConfig) -> Self {
        Self {
            config,
            racer_a: Racer::new(DRAG_LANE_A_Z),
            racer_b: Racer::new(DRAG_LANE_B_Z),
            started: false,
            completed: false,
            winner: Winner::None,
            start_time: 0.0,
            current_time: 0.0,
        }
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn racer_a(&self) -> &Racer {
        &self.racer_a
    }

    pub fn racer_b(&self) -> &Racer {
        &self.racer_b
    }

    pub fn winner(&self) -> Winner {
        self.winner
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn finish_line_x(&self) -> f32 {
        self.config.finish_line_x
    }

    fn judge(&self) -> Winner {
        let line = self.config.finish_line_x;
        let a = self.racer_a.x;
        let b = self.racer_b.x;
        match (a > line, b > line) {
            (true, true) => {
                if a > b {
                    Winner::A
                } else if b > a {
                    Winner::B
                } else {
                    match self.config.tie_break {
                        TieBreak::Draw => Winner::Draw,
                        TieBreak::FirstRacer => Winner::A,
                    }
                }
            }
            (true, false) => Winner::A,
            (false, true) => Winner::B,
            (false, false) => Winner::None,
        }
    }
}

impl Race for DragRace {
    fn start(&mut self, now: f64) {
        self.started = true;
        self.start_time = now;
        // A decided race keeps its result; completion is terminal.
        if !self.completed {
            self.winner = Winner::None;
        }
        debug!("Drag race started at {}", now);
    }

    fn update(&mut self, delta: f32, now: f64, keys: &KeySet) -> Result<(), RaceError> {
        validate_tick(delta, now)?;
        if !self.started || self.completed {
            return Ok(());
        }

        let pedals_a = PedalControls::resolve(keys, RACER_A_ACCELERATE, RACER_A_BRAKE);
        let pedals_b = PedalControls::resolve(keys, RACER_B_ACCELERATE, RACER_B_BRAKE);
        let mut racer_a = self.racer_a;
        let mut racer_b = self.racer_b;
        racer_a.drive(pedals_a, &self.config, delta);
        racer_b.drive(pedals_b, &self.config, delta);
        ensure_finite_motion(&[racer_a.x, racer_b.x])?;

        self.current_time = elapsed_seconds(self.start_time, now);
        self.racer_a = racer_a;
        self.racer_b = racer_b;

        let winner = self.judge();
        if winner != Winner::None {
            self.completed = true;
            self.winner = winner;
            info!(
                "Drag race finished after {:.2}s, winner {:?}",
                self.current_time, winner
            );
        }
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
