//=========================================================================
// Process Host
//=========================================================================
//
// Process-level collaborator: command-line flags, environment queries and
// termination. Consulted only at startup and shutdown.
//
// `quit()` records an exit code; the engine loop stops at the end of the
// tick in which it was called, and the binary exits with that code.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::env;

use log::info;

//=== ProcessHost =========================================================

pub trait ProcessHost {
    /// Requests process termination with `exit_code`.
    fn quit(&mut self, exit_code: i32);

    /// Exit code requested via [`quit`](Self::quit), if any.
    fn exit_code(&self) -> Option<i32>;

    /// Command-line arguments, program name excluded.
    fn args(&self) -> &[String];

    fn env_var(&self, key: &str) -> Option<String>;

    fn has_flag(&self, flag: &str) -> bool {
        self.args().iter().any(|arg| arg == flag)
    }

    /// Value of a `--name=value` argument.
    fn flag_value(&self, name: &str) -> Option<&str> {
        self.args().iter().find_map(|arg| {
            arg.strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
        })
    }
}

//=== NativeHost ==========================================================

/// Host backed by the real process arguments and environment.
///
/// Environment overrides take precedence over the process environment,
/// which keeps detection deterministic in tests.
#[derive(Debug, Clone, Default)]
pub struct NativeHost {
    args: Vec<String>,
    env_overrides: HashMap<String, String>,
    exit_code: Option<i32>,
}

impl NativeHost {
    /// Captures the arguments of the running process.
    pub fn from_env() -> Self {
        Self::with_args(env::args().skip(1))
    }

    pub fn with_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env_overrides: HashMap::new(),
            exit_code: None,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.insert(key.into(), value.into());
        self
    }
}

impl ProcessHost for NativeHost {
    fn quit(&mut self, exit_code: i32) {
        if self.exit_code.is_none() {
            info!("Process quit requested (exit code {})", exit_code);
            self.exit_code = Some(exit_code);
        }
    }

    fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    fn env_var(&self, key: &str) -> Option<String> {
        self.env_overrides
            .get(key)
            .cloned()
            .or_else(|| env::var(key).ok())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
