//! Editor options from TOML files.
//!
//! Options live under an `[editor]` table using the same kebab-case keys as
//! [`EditorOptions`]:
//!
//! ```toml
//! [editor]
//! theme = "bubble"
//! debounce-ms = 250
//! formats = ["bold", "italic", "link"]
//!
//! [editor.modules]
//! toolbar = "#toolbar"
//! ```
//!
//! A local file is layered over the global one, table by table.

use std::{
  fs,
  io::Error as IOError,
  path::Path,
};

use serde::Deserialize;
use thiserror::Error;
use toml::{
  Value,
  de::Error as TomlError,
};

use crate::props::EditorOptions;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
  pub editor: EditorOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigRaw {
  editor: Option<Value>,
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
  #[error("bad config: {0}")]
  BadConfig(TomlError),
  #[error(transparent)]
  Error(IOError),
}

impl Config {
  pub fn from_toml(text: &str) -> Result<Config, ConfigLoadError> {
    Self::load(Ok(text.to_string()), Ok(String::new()))
  }

  /// Merge `local` over `global`. A missing file on either side is fine; a
  /// file that does not parse is not.
  pub fn load(
    global: Result<String, ConfigLoadError>,
    local: Result<String, ConfigLoadError>,
  ) -> Result<Config, ConfigLoadError> {
    let global_config: Result<ConfigRaw, ConfigLoadError> =
      global.and_then(|file| toml::from_str(&file).map_err(ConfigLoadError::BadConfig));
    let local_config: Result<ConfigRaw, ConfigLoadError> =
      local.and_then(|file| toml::from_str(&file).map_err(ConfigLoadError::BadConfig));

    let editor = match (global_config, local_config) {
      (Ok(global), Ok(local)) => {
        match (global.editor, local.editor) {
          (None, None) => None,
          (None, Some(val)) | (Some(val), None) => Some(val),
          (Some(global), Some(local)) => Some(merge_toml_values(global, local, 3)),
        }
      },
      (_, Err(ConfigLoadError::BadConfig(err))) | (Err(ConfigLoadError::BadConfig(err)), _) => {
        return Err(ConfigLoadError::BadConfig(err));
      },
      (Ok(config), Err(_)) | (Err(_), Ok(config)) => config.editor,
      (Err(err), Err(_)) => return Err(err),
    };

    let editor = match editor {
      Some(val) => val.try_into().map_err(ConfigLoadError::BadConfig)?,
      None => EditorOptions::default(),
    };
    Ok(Config { editor })
  }

  pub fn load_from(global: &Path, local: &Path) -> Result<Config, ConfigLoadError> {
    let global_config = fs::read_to_string(global).map_err(ConfigLoadError::Error);
    let local_config = fs::read_to_string(local).map_err(ConfigLoadError::Error);
    log::debug!("loading editor config from {global:?} and {local:?}");
    Self::load(global_config, local_config)
  }
}

/// Merge two TOML values, `right` taking precedence.
///
/// Tables are merged key by key down to `merge_depth` levels; below that, and
/// for every other kind of value including arrays, `right` replaces `left`.
pub fn merge_toml_values(left: Value, right: Value, merge_depth: usize) -> Value {
  match (left, right) {
    (Value::Table(mut left_map), Value::Table(right_map)) if merge_depth > 0 => {
      for (key, right_value) in right_map {
        let merged = match left_map.remove(&key) {
          Some(left_value) => merge_toml_values(left_value, right_value, merge_depth - 1),
          None => right_value,
        };
        left_map.insert(key, merged);
      }
      Value::Table(left_map)
    },
    (_, value) => value,
  }
}
