//! Configuration.
//!
//! [`InputConfig`] tunes the input context itself. [`SequenceConfig`] is the
//! JSON file of named key and mouse sequences the host program registers at
//! startup.

use crate::event::{KeyEvent, MouseEvent, MOUSE_LEFT_DOWN};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default name of the dedicated input worker thread.
pub const DEFAULT_THREAD_NAME: &str = "wininput-hooks";

/// Configuration for an [`InputContext`](crate::context::InputContext).
#[derive(Debug, Clone)]
pub struct InputConfig {
    /// Name given to the worker thread that owns the hooks.
    pub thread_name: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

/// A named key sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySequenceConfig {
    pub name: String,
    pub keys: Vec<KeyEvent>,

    /// Require modifiers to match exactly.
    #[serde(default)]
    pub strict: bool,

    /// Consume the key that completes the sequence.
    #[serde(default)]
    pub consume: bool,
}

/// A named mouse sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseSequenceConfig {
    pub name: String,
    pub events: Vec<MouseEvent>,

    /// Allowed pixel deviation per axis.
    #[serde(default)]
    pub tolerance: u32,

    #[serde(default)]
    pub consume: bool,
}

/// Sequences loaded from `sequences.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    #[serde(default)]
    pub key_sequences: Vec<KeySequenceConfig>,

    #[serde(default)]
    pub mouse_sequences: Vec<MouseSequenceConfig>,
}

impl SequenceConfig {
    /// Returns the default config path, `<config dir>/wininput/sequences.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wininput")
            .join("sequences.json")
    }

    /// Loads sequences from `path`, falling back to [`SequenceConfig::builtin`]
    /// when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                tracing::info!(path = ?path, "Loaded sequence config");
                Self::from_json(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = ?path, "No sequence config, using built-in sequences");
                Ok(Self::builtin())
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Parse)
    }

    /// Ctrl+Shift+4, Shift+H E L L O, and a double left click near the
    /// screen origin.
    pub fn builtin() -> Self {
        Self {
            key_sequences: vec![
                KeySequenceConfig {
                    name: "ctrl+shift+4".to_string(),
                    keys: vec![KeyEvent::down(0x34).ctrl().shift()],
                    strict: true,
                    consume: false,
                },
                KeySequenceConfig {
                    name: "hello".to_string(),
                    keys: vec![
                        KeyEvent::down(0x48).shift(),
                        KeyEvent::down(0x45),
                        KeyEvent::down(0x4C),
                        KeyEvent::down(0x4C),
                        KeyEvent::down(0x4F),
                    ],
                    strict: true,
                    consume: false,
                },
            ],
            mouse_sequences: vec![MouseSequenceConfig {
                name: "corner double click".to_string(),
                events: vec![
                    MouseEvent::new(MOUSE_LEFT_DOWN, 0, 0),
                    MouseEvent::new(MOUSE_LEFT_DOWN, 0, 0),
                ],
                tolerance: 10,
                consume: false,
            }],
        }
    }
}

/// Errors loading a [`SequenceConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "Invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}
