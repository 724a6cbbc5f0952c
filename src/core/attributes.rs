//=========================================================================
// Entity Attributes
//=========================================================================
//
// Read-only numeric parameters per player entity. The spawn coordinator
// resolves `MovementParams` once per spawn; movement integration itself
// lives outside this crate.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

//=== Internal Dependencies ===============================================

use crate::core::session::PlayerId;

//=== Keys ================================================================

pub const SPEED: &str = "speed";
pub const GRAVITY: &str = "gravity";
pub const TURN_RATE: &str = "turn_rate";

//=== AttributeSource =====================================================

/// Key/value source of per-entity parameters.
pub trait AttributeSource {
    fn attribute(&self, player: PlayerId, key: &str) -> Option<f32>;
}

//=== AttributeTable ======================================================

/// Attribute source with shared defaults and per-player overrides.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    shared: HashMap<String, f32>,
    overrides: HashMap<(PlayerId, String), f32>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value for every player.
    pub fn set(&mut self, key: impl Into<String>, value: f32) -> &mut Self {
        self.shared.insert(key.into(), value);
        self
    }

    /// Sets a value for one player, shadowing the shared value.
    pub fn set_for(&mut self, player: PlayerId, key: impl Into<String>, value: f32) -> &mut Self {
        self.overrides.insert((player, key.into()), value);
        self
    }
}

impl AttributeSource for AttributeTable {
    fn attribute(&self, player: PlayerId, key: &str) -> Option<f32> {
        self.overrides
            .get(&(player, key.to_string()))
            .or_else(|| self.shared.get(key))
            .copied()
    }
}

//=== MovementParams ======================================================

/// Movement parameters resolved for a spawned player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementParams {
    pub speed: f32,
    pub gravity: f32,
    pub turn_rate: f32,
}

impl Default for MovementParams {
    fn default() -> Self {
        Self {
            speed: 5.0,
            gravity: 9.8,
            turn_rate: 0.33,
        }
    }
}

impl MovementParams {
    /// Reads each parameter from `source`, keeping the default for any
    /// key it does not supply.
    pub fn resolve(source: &dyn AttributeSource, player: PlayerId) -> Self {
        let defaults = Self::default();
        Self {
            speed: source.attribute(player, SPEED).unwrap_or(defaults.speed),
            gravity: source.attribute(player, GRAVITY).unwrap_or(defaults.gravity),
            turn_rate: source.attribute(player, TURN_RATE).unwrap_or(defaults.turn_rate),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
