//=========================================================================
// Environment
//=========================================================================
//
// Runtime environment detection and per-environment data directories.
//
// Detection order:
//   --env=<kind> argument
//     → debug build                      ⇒ Development
//     → SESSION_CONDUCTOR_TESTING set    ⇒ Testing
//     → otherwise                        ⇒ Production
//
// Data layout:
//   <data root>/<kind>/settings/game_settings.toml
//   <data root>/<kind>/logs/<name>_<unix seconds>.log
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{info, warn};

//=== Internal Dependencies ===============================================

use crate::core::config::ConfigError;
use crate::core::host::ProcessHost;

/// Environment variable that selects the Testing environment in release
/// builds.
pub const TESTING_ENV_VAR: &str = "SESSION_CONDUCTOR_TESTING";

const APP_DIR: &str = "session-conductor";

//=== EnvironmentKind =====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentKind {
    Development,
    Production,
    Testing,
}

impl EnvironmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentKind::Development => "development",
            EnvironmentKind::Production => "production",
            EnvironmentKind::Testing => "testing",
        }
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(EnvironmentKind::Development),
            "production" | "prod" => Ok(EnvironmentKind::Production),
            "testing" | "test" => Ok(EnvironmentKind::Testing),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

//=== Environment =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    kind: EnvironmentKind,
    data_root: Option<PathBuf>,
}

impl Environment {
    /// Detects the environment from the host's flags and variables.
    pub fn detect(host: &dyn ProcessHost) -> Self {
        let mut kind = if cfg!(debug_assertions) {
            EnvironmentKind::Development
        } else if host.env_var(TESTING_ENV_VAR).is_some() {
            EnvironmentKind::Testing
        } else {
            EnvironmentKind::Production
        };

        if let Some(requested) = host.flag_value("--env") {
            match requested.parse() {
                Ok(requested) => kind = requested,
                Err(e) => warn!("Ignoring --env: {}", e),
            }
        }

        let data_root = platform_data_root(host).map(|root| root.join(kind.as_str()));
        info!("Environment: {}", kind);
        Self { kind, data_root }
    }

    /// Environment without a data root. Nothing is written to disk.
    pub fn ephemeral(kind: EnvironmentKind) -> Self {
        Self { kind, data_root: None }
    }

    /// Environment rooted at an explicit directory.
    pub fn rooted(kind: EnvironmentKind, root: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            data_root: Some(root.into()),
        }
    }

    pub fn kind(&self) -> EnvironmentKind {
        self.kind
    }

    pub fn data_root(&self) -> Option<&PathBuf> {
        self.data_root.as_ref()
    }

    pub fn data_dir(&self, category: &str) -> Option<PathBuf> {
        self.data_root.as_ref().map(|root| root.join(category))
    }

    pub fn settings_file(&self) -> Option<PathBuf> {
        self.data_dir("settings").map(|dir| dir.join("game_settings.toml"))
    }

    /// Writes a timestamped log entry under `logs/`.
    ///
    /// Returns the written path, or `None` for an ephemeral environment
    /// (the entry then only goes to the log facade).
    pub fn write_log(&self, name: &str, content: &str) -> Result<Option<PathBuf>, ConfigError> {
        info!("[{}] {}", name, content);

        let Some(dir) = self.data_dir("logs") else {
            return Ok(None);
        };
        fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}_{}.log", name, unix_seconds()));
        fs::write(&path, content)?;
        Ok(Some(path))
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn platform_data_root(host: &dyn ProcessHost) -> Option<PathBuf> {
    match std::env::consts::OS {
        "windows" => host
            .env_var("USERPROFILE")
            .map(|home| PathBuf::from(home).join("Documents").join("My Games").join(APP_DIR)),
        "macos" => host
            .env_var("HOME")
            .map(|home| PathBuf::from(home).join("Library").join("Application Support").join(APP_DIR)),
        _ => host
            .env_var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| host.env_var("HOME").map(|home| PathBuf::from(home).join(".local").join("share")))
            .map(|base| base.join(APP_DIR)),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::NativeHost;

    #[test]
    fn env_flag_overrides_build_default() {
        let host = NativeHost::with_args(["--env=testing"]);

        let environment = Environment::detect(&host);

        assert_eq!(environment.kind(), EnvironmentKind::Testing);
    }

    #[test]
    fn invalid_env_flag_is_ignored() {
        let host = NativeHost::with_args(["--env=staging"]);

        let environment = Environment::detect(&host);

        assert_ne!(environment.kind(), EnvironmentKind::Testing);
    }

    #[test]
    fn data_dirs_nest_under_environment_kind() {
        let host = NativeHost::with_args(["--env=production"])
            .with_env("HOME", "/home/tester")
            .with_env("XDG_DATA_HOME", "/home/tester/.data")
            .with_env("USERPROFILE", "C:/Users/tester");

        let environment = Environment::detect(&host);

        let settings = environment.settings_file().unwrap();
        assert!(settings.ends_with("production/settings/game_settings.toml"));
    }

    #[test]
    fn ephemeral_environment_writes_nothing() {
        let environment = Environment::ephemeral(EnvironmentKind::Testing);

        let written = environment.write_log("shutdown", "bye").unwrap();

        assert!(written.is_none());
        assert!(environment.settings_file().is_none());
    }

    #[test]
    fn rooted_environment_writes_log_files() {
        let root = std::env::temp_dir().join(format!("session_conductor_env_{}", std::process::id()));
        let environment = Environment::rooted(EnvironmentKind::Testing, &root);

        let written = environment.write_log("shutdown", "bye").unwrap().unwrap();

        assert!(written.starts_with(root.join("logs")));
        assert_eq!(fs::read_to_string(&written).unwrap(), "bye");
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn kind_parses_short_names() {
        assert_eq!("DEV".parse::<EnvironmentKind>(), Ok(EnvironmentKind::Development));
        assert!("qa".parse::<EnvironmentKind>().is_err());
    }
}
