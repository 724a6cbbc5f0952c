//=========================================================================
// Host Bridge Interface
//=========================================================================
//
// Host-to-core contract: commands typed by an operator or a front end,
// per-tick input frames, and shutdown.
//
// Command grammar (one per line):
//   start | pause | resume | back | settings | menu | quit | save
//   scene <path> | join <id> | set <key> <value>
//
//=========================================================================

//=== External Dependencies ===============================================

use std::str::FromStr;

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::content::ResourcePath;
use crate::core::input::InputFrame;
use crate::core::session::PlayerId;
use crate::core::settings::SettingValue;

//=== HostEvent ===========================================================

/// Events sent from the host to the core over the bridge channel.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Command(HostCommand),
    /// Input for the coming tick.
    Input(InputFrame),
    /// The host is going away (window closed, stdin ended).
    Shutdown,
}

//=== HostCommand =========================================================

#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    StartSession,
    Pause,
    Resume,
    Back,
    OpenSettings,
    MainMenu,
    Quit,
    ChangeScene(ResourcePath),
    Join(PlayerId),
    UpdateSetting { key: String, value: SettingValue },
    SaveSettings,
}

/// Failure to parse a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{command}' expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("invalid player id '{0}'")]
    InvalidPlayerId(String),
}

impl FromStr for HostCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(ParseCommandError::Empty);
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "start" => HostCommand::StartSession,
            "pause" => HostCommand::Pause,
            "resume" => HostCommand::Resume,
            "back" => HostCommand::Back,
            "settings" => HostCommand::OpenSettings,
            "menu" => HostCommand::MainMenu,
            "quit" | "exit" => HostCommand::Quit,
            "save" => HostCommand::SaveSettings,
            "scene" => {
                let path = words.next().ok_or(ParseCommandError::MissingArgument {
                    command: "scene",
                    expected: "a resource path",
                })?;
                HostCommand::ChangeScene(ResourcePath::new(path))
            }
            "join" => {
                let raw = words.next().ok_or(ParseCommandError::MissingArgument {
                    command: "join",
                    expected: "a player id",
                })?;
                let id = raw
                    .parse()
                    .map_err(|_| ParseCommandError::InvalidPlayerId(raw.to_string()))?;
                HostCommand::Join(PlayerId(id))
            }
            "set" => {
                let (Some(key), Some(value)) = (words.next(), words.next()) else {
                    return Err(ParseCommandError::MissingArgument {
                        command: "set",
                        expected: "a key and a value",
                    });
                };
                HostCommand::UpdateSetting {
                    key: key.to_string(),
                    value: SettingValue::parse(value),
                }
            }
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
