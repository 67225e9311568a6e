use thiserror::Error;

use waypoint_config::PathError;
use waypoint_engine::ConfigError;

/// Errors that can occur while resolving a wizard definition.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// The definition has no steps.
  #[error("wizard '{wizard_id}' has no steps")]
  NoSteps { wizard_id: String },

  /// Two steps share an id.
  #[error("duplicate step id: {step_id}")]
  DuplicateStepId { step_id: String },

  /// Two actions on one step share a key.
  #[error("duplicate action key '{key}' on step '{step_id}'")]
  DuplicateActionKey { step_id: String, key: String },

  /// A goto navigation names a step that does not exist.
  #[error("action '{action}' on step '{step_id}' targets unknown step '{target}'")]
  UnknownGotoTarget {
    step_id: String,
    action: String,
    target: String,
  },

  /// A condition or effect uses a malformed pointer.
  #[error("invalid path on step '{step_id}': {source}")]
  InvalidPath {
    step_id: String,
    #[source]
    source: PathError,
  },

  /// The engine rejected the resolved configuration.
  #[error("engine configuration error: {0}")]
  Config(#[from] ConfigError),
}
