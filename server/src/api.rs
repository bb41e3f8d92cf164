//! JSON records exchanged with the browser client
//!
//! The race engines expose their state through accessors; this module flattens
//! those accessor values into the records the client reads every frame, and
//! maps engine and session failures onto HTTP responses.

use crate::game::SessionError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use shared::{CircuitRace, DragRace, KeySet, Race, RaceError};

/// Body of an update request: keys held this frame and the frame time in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    pub delta: f32,
}

impl UpdateRequest {
    /// Converts the key list into a [`KeySet`], rejecting a missing list.
    pub fn key_set(&self) -> Result<KeySet, RaceError> {
        match &self.keys {
            Some(keys) => Ok(keys.iter().map(String::as_str).collect()),
            None => Err(RaceError::InvalidInput("missing key list".to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartResponse {
    pub message: String,
    pub start_time: f64,
}

/// Flat drag race record; racer A is `creature1`, racer B is `creature2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragStatus {
    pub creature1_x: f32,
    pub creature1_y: f32,
    pub creature1_z: f32,
    pub creature1_speed: f32,
    pub creature2_x: f32,
    pub creature2_y: f32,
    pub creature2_z: f32,
    pub creature2_speed: f32,
    pub game_started: bool,
    pub game_completed: bool,
    pub winner: u8,
    pub current_time: f64,
}

impl From<&DragRace> for DragStatus {
    fn from(race: &DragRace) -> Self {
        let a = race.racer_a();
        let b = race.racer_b();
        Self {
            creature1_x: a.x,
            creature1_y: a.y,
            creature1_z: a.z,
            creature1_speed: a.speed,
            creature2_x: b.x,
            creature2_y: b.y,
            creature2_z: b.z,
            creature2_speed: b.speed,
            game_started: race.is_started(),
            game_completed: race.is_completed(),
            winner: race.winner().code(),
            current_time: race.current_time(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitStatus {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation_y: f32,
    pub speed: f32,
    pub lap: u32,
    pub total_laps: u32,
    pub race_started: bool,
    pub race_completed: bool,
    pub current_time: f64,
}

impl From<&CircuitRace> for CircuitStatus {
    fn from(race: &CircuitRace) -> Self {
        Self {
            x: race.x(),
            y: race.y(),
            z: race.z(),
            rotation_y: race.heading(),
            speed: race.speed(),
            lap: race.lap(),
            total_laps: race.total_laps(),
            race_started: race.is_started(),
            race_completed: race.is_completed(),
            current_time: race.current_time(),
        }
    }
}

/// Status of either race, serialized without a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RaceSnapshot {
    Circuit(CircuitStatus),
    Drag(DragStatus),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionError::Race(RaceError::InvalidInput(_)) | SessionError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            SessionError::Race(RaceError::InvalidConfiguration(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            SessionError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
