//=========================================================================
// Settings
//=========================================================================
//
// Settings store collaborator and its TOML-backed implementation.
//
// Flow:
//   set(key, value) → normalize → changed? → Some(applied)
//                                               ↓
//   GlobalContext::update_setting ──→ GameEvent::SettingUpdated
//
//   save() → [settings] table → TOML file (or no-op in memory)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::config::ConfigError;

//=== Keys ================================================================

pub const RESOLUTION_WIDTH: &str = "resolution_width";
pub const RESOLUTION_HEIGHT: &str = "resolution_height";
pub const RESOLUTION_SCALE: &str = "resolution_scale";
pub const FULLSCREEN: &str = "fullscreen";
pub const VOLUME_MASTER: &str = "volume_master";
pub const VOLUME_MUSIC: &str = "volume_music";
pub const VOLUME_SFX: &str = "volume_sfx";
pub const UI_MENU_OPACITY: &str = "ui_menu_opacity";
pub const GRAPHICS_FOV: &str = "graphics_fov";
pub const INPUT_SENSITIVITY: &str = "input_sensitivity";

//=== SettingValue ========================================================

/// A single setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SettingValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Int(v) => Some(*v as f64),
            SettingValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Parses a command-line literal: bool, then integer, then float,
    /// falling back to text.
    pub fn parse(raw: &str) -> Self {
        if let Ok(v) = raw.parse::<bool>() {
            SettingValue::Bool(v)
        } else if let Ok(v) = raw.parse::<i64>() {
            SettingValue::Int(v)
        } else if let Ok(v) = raw.parse::<f64>() {
            SettingValue::Float(v)
        } else {
            SettingValue::Text(raw.to_string())
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(v) => write!(f, "{v}"),
            SettingValue::Int(v) => write!(f, "{v}"),
            SettingValue::Float(v) => write!(f, "{v}"),
            SettingValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Float(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Text(v.to_string())
    }
}

//=== SettingsStore =======================================================

/// Settings collaborator.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<SettingValue>;

    fn get_or(&self, key: &str, default: SettingValue) -> SettingValue {
        self.get(key).unwrap_or(default)
    }

    /// Stores `value` under `key`.
    ///
    /// Returns the value actually applied (after normalization) if the
    /// stored value changed, `None` if it was rejected or unchanged.
    fn set(&mut self, key: &str, value: SettingValue) -> Option<SettingValue>;

    /// Persists the current values.
    fn save(&mut self) -> Result<(), ConfigError>;
}

//=== Normalization =======================================================

fn clamp_float(value: &SettingValue, min: f64, max: f64) -> Option<SettingValue> {
    value.as_f64().map(|v| SettingValue::Float(v.clamp(min, max)))
}

/// Applies the range rules of known keys. Unknown keys pass through.
fn normalize(key: &str, value: SettingValue) -> Option<SettingValue> {
    match key {
        GRAPHICS_FOV => clamp_float(&value, 60.0, 120.0),
        VOLUME_MASTER | VOLUME_MUSIC | VOLUME_SFX | UI_MENU_OPACITY => {
            clamp_float(&value, 0.0, 1.0)
        }
        INPUT_SENSITIVITY => clamp_float(&value, 0.01, 1.0),
        RESOLUTION_SCALE => value
            .as_f64()
            .filter(|v| (0.1..=4.0).contains(v))
            .map(SettingValue::Float),
        FULLSCREEN => value.as_bool().map(SettingValue::Bool),
        _ => Some(value),
    }
}

//=== SettingsFile ========================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    settings: BTreeMap<String, SettingValue>,
}

/// Settings store persisted as a `[settings]` TOML table.
///
/// An in-memory instance has no path; `save` then only clears the dirty
/// flag.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    values: BTreeMap<String, SettingValue>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl SettingsFile {
    pub fn defaults() -> BTreeMap<String, SettingValue> {
        BTreeMap::from([
            (RESOLUTION_WIDTH.to_string(), SettingValue::Int(1920)),
            (RESOLUTION_HEIGHT.to_string(), SettingValue::Int(1080)),
            (RESOLUTION_SCALE.to_string(), SettingValue::Float(1.0)),
            (FULLSCREEN.to_string(), SettingValue::Bool(true)),
            (VOLUME_MASTER.to_string(), SettingValue::Float(1.0)),
            (VOLUME_MUSIC.to_string(), SettingValue::Float(0.8)),
            (VOLUME_SFX.to_string(), SettingValue::Float(1.0)),
            (UI_MENU_OPACITY.to_string(), SettingValue::Float(0.8)),
            (GRAPHICS_FOV.to_string(), SettingValue::Float(90.0)),
            (INPUT_SENSITIVITY.to_string(), SettingValue::Float(0.33)),
        ])
    }

    pub fn in_memory() -> Self {
        Self {
            values: Self::defaults(),
            path: None,
            dirty: false,
        }
    }

    /// Loads settings from `path`, layering them over the defaults. A
    /// missing file is created with the defaults.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let mut file = Self {
            values: Self::defaults(),
            path: Some(path.clone()),
            dirty: false,
        };

        if !path.exists() {
            info!("No settings file at {}, writing defaults", path.display());
            file.save()?;
            return Ok(file);
        }

        let contents = fs::read_to_string(&path)?;
        let document: SettingsDocument =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        for (key, value) in document.settings {
            match normalize(&key, value) {
                Some(value) => {
                    file.values.insert(key, value);
                }
                None => warn!("Ignoring invalid stored value for setting '{}'", key),
            }
        }
        debug!("Settings loaded from {}", path.display());
        Ok(file)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl SettingsStore for SettingsFile {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: SettingValue) -> Option<SettingValue> {
        let Some(applied) = normalize(key, value) else {
            warn!("Rejected value for setting '{}'", key);
            return None;
        };
        if self.values.get(key) == Some(&applied) {
            return None;
        }

        self.values.insert(key.to_string(), applied.clone());
        self.dirty = true;
        Some(applied)
    }

    fn save(&mut self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            let document = SettingsDocument {
                settings: self.values.clone(),
            };
            let contents = toml::to_string_pretty(&document)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, contents)?;
            info!("Settings saved to {}", path.display());
        }
        self.dirty = false;
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
