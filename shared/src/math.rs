use crate::error::RaceError;
use std::f32::consts::{PI, TAU};

/// Brings a difference of two `atan2` results into (-π, π].
///
/// Both inputs lie in [-π, π], so one correction is always enough.
pub fn wrap_angle(diff: f32) -> f32 {
    if diff > PI {
        diff - TAU
    } else if diff <= -PI {
        diff + TAU
    } else {
        diff
    }
}

/// Angle of a point on the ground plane as seen from the track centre.
pub fn polar_angle(x: f32, z: f32) -> f32 {
    z.atan2(x)
}

/// Whole turns contained in an accumulated angle, regardless of direction.
pub fn laps_from_angle(total_angle: f32) -> u32 {
    (total_angle.abs() / TAU).floor() as u32
}

/// Rejects tick arguments that would corrupt the simulation.
pub fn validate_tick(delta: f32, now: f64) -> Result<(), RaceError> {
    if !delta.is_finite() {
        return Err(RaceError::InvalidInput(format!("delta {} is not finite", delta)));
    }
    if delta < 0.0 {
        return Err(RaceError::InvalidInput(format!("delta {} is negative", delta)));
    }
    if !now.is_finite() {
        return Err(RaceError::InvalidInput(format!("timestamp {} is not finite", now)));
    }
    Ok(())
}

/// Rejects a tick whose integrated motion left the finite range.
///
/// A finite but huge `delta` can still overflow `speed * delta`; callers
/// step a copy of their state and only commit it once this passes.
pub fn ensure_finite_motion(values: &[f32]) -> Result<(), RaceError> {
    if values.iter().all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(RaceError::InvalidInput(
            "delta is too large to integrate".to_string(),
        ))
    }
}

/// Seconds between two millisecond timestamps.
pub fn elapsed_seconds(start_ms: f64, now_ms: f64) -> f64 {
    (now_ms - start_ms) / 1000.0
}
