//! Pressed-control snapshots and the alias tables each engine reads.

use crate::error::RaceError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MOVE_FORWARD: &[&str] = &["move-forward", "ArrowUp", "KeyW"];
pub const MOVE_BACKWARD: &[&str] = &["move-backward", "ArrowDown", "KeyS", "Space"];
pub const TURN_LEFT: &[&str] = &["turn-left", "ArrowLeft", "KeyA"];
pub const TURN_RIGHT: &[&str] = &["turn-right", "ArrowRight", "KeyD"];

pub const RACER_A_ACCELERATE: &[&str] = &["KeyW"];
pub const RACER_A_BRAKE: &[&str] = &["KeyS"];
pub const RACER_B_ACCELERATE: &[&str] = &["ArrowUp"];
pub const RACER_B_BRAKE: &[&str] = &["ArrowDown"];

/// Unordered set of control identifiers held down during one tick.
///
/// Only membership is ever tested, so duplicates collapse and unknown
/// identifiers are carried along harmlessly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySet {
    keys: HashSet<String>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a JSON array of strings, the shape browsers send key codes in.
    pub fn from_json(text: &str) -> Result<Self, RaceError> {
        let keys: Vec<String> = serde_json::from_str(text)
            .map_err(|e| RaceError::InvalidInput(format!("malformed key list: {}", e)))?;
        Ok(Self::from_keys(keys))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn contains_any(&self, aliases: &[&str]) -> bool {
        aliases.iter().any(|alias| self.keys.contains(*alias))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KeySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_keys(iter)
    }
}

/// Logical controls of the circuit car, resolved from one [`KeySet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveControls {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl DriveControls {
    pub fn resolve(keys: &KeySet) -> Self {
        Self {
            forward: keys.contains_any(MOVE_FORWARD),
            backward: keys.contains_any(MOVE_BACKWARD),
            left: keys.contains_any(TURN_LEFT),
            right: keys.contains_any(TURN_RIGHT),
        }
    }
}

/// Throttle and brake of one drag racer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PedalControls {
    pub accelerate: bool,
    pub brake: bool,
}

impl PedalControls {
    pub fn resolve(keys: &KeySet, accelerate: &[&str], brake: &[&str]) -> Self {
        Self {
            accelerate: keys.contains_any(accelerate),
            brake: keys.contains_any(brake),
        }
    }
}
