use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PathError;
use crate::pointer;

/// A declarative edit of the JSON data bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EffectDef {
  /// Write `value` at `path`, creating intermediate objects.
  Set { path: String, value: Value },
  /// Delete the value at `path` if present.
  Remove { path: String },
}

impl EffectDef {
  pub fn set(path: impl Into<String>, value: Value) -> Self {
    EffectDef::Set {
      path: path.into(),
      value,
    }
  }

  pub fn remove(path: impl Into<String>) -> Self {
    EffectDef::Remove { path: path.into() }
  }

  pub fn path(&self) -> &str {
    match self {
      EffectDef::Set { path, .. } | EffectDef::Remove { path } => path,
    }
  }

  pub fn apply(&self, values: &mut Value) -> Result<(), PathError> {
    match self {
      EffectDef::Set { path, value } => pointer::set(values, path, value.clone()),
      EffectDef::Remove { path } => pointer::remove(values, path).map(|_| ()),
    }
  }

  pub fn validate(&self) -> Result<(), PathError> {
    pointer::validate(self.path())
  }
}
