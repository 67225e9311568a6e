use thiserror::Error;

/// Errors raised while evaluating a condition or applying an effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
  /// The path is not a JSON pointer (it must start with `/`).
  #[error("invalid JSON pointer: '{path}'")]
  InvalidPointer { path: String },

  /// The pointer walks through a value that cannot hold children, or names an
  /// array index that is out of range.
  #[error("cannot write '{path}': {reason}")]
  InvalidTarget { path: String, reason: String },
}

impl PathError {
  pub(crate) fn invalid_target(path: &str, reason: impl Into<String>) -> Self {
    Self::InvalidTarget {
      path: path.to_string(),
      reason: reason.into(),
    }
  }
}
