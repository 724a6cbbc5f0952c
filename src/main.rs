//=========================================================================
// Session Conductor: Terminal Host
//
// Runs the session core with a line-oriented command prompt as its host.
//
// Flags:
//   --config=<file>   engine configuration (TOML)
//   --content=<file>  content manifest (TOML); the bundled demo otherwise
//   --env=<kind>      development | production | testing
//
// Commands are read from stdin, one per line (`start`, `pause`, `back`,
// `scene <path>`, `join <id>`, `set <key> <value>`, `quit`, ...). End of
// input shuts the core down.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::io::{self, BufRead};
use std::process;
use std::thread;

use crossbeam_channel::Sender;
use env_logger::Env;
use log::{error, info, warn};

//=== Internal Dependencies ===============================================

use session_conductor::core::config::{ConfigError, EngineConfig};
use session_conductor::core::content::MemoryContentStore;
use session_conductor::core::environment::Environment;
use session_conductor::core::host::{NativeHost, ProcessHost};
use session_conductor::core::settings::SettingsFile;
use session_conductor::prelude::*;

const DEMO_CONTENT: &str = include_str!("../demos/content.toml");

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match launch() {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("Startup failed: {}", e);
            process::exit(1);
        }
    }
}

fn launch() -> Result<i32, Box<dyn std::error::Error>> {
    let host = NativeHost::from_env();
    let environment = Environment::detect(&host);

    let config = match host.flag_value("--config") {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };
    let content = match host.flag_value("--content") {
        Some(path) => MemoryContentStore::from_manifest_file(path)?,
        None => MemoryContentStore::from_manifest_str(DEMO_CONTENT)?,
    };
    let settings = load_settings(&environment)?;

    let engine = EngineBuilder::new()
        .with_config(config)
        .with_content(content)
        .with_settings(settings)
        .with_environment(environment)
        .with_host(host)
        .build()?;

    spawn_prompt(engine.sender());
    Ok(engine.run())
}

fn load_settings(environment: &Environment) -> Result<SettingsFile, ConfigError> {
    match environment.settings_file() {
        Some(path) => SettingsFile::load_or_create(path),
        None => Ok(SettingsFile::in_memory()),
    }
}

//=== Command Prompt ======================================================

/// Forwards parsed stdin lines to the core until input ends or the core
/// hangs up.
fn spawn_prompt(sender: Sender<HostEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("stdin: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<HostCommand>() {
                Ok(command) => {
                    if sender.send(HostEvent::Command(command)).is_err() {
                        return;
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
        info!("Input closed");
        let _ = sender.send(HostEvent::Shutdown);
    });
}
