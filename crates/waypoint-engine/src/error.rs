//! Error types for wizard configuration and navigation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure reported by a guard, lifecycle hook, effect or callback.
///
/// Returning `Err(HookError)` from a hook future is how author code signals
/// an unexpected failure. A panic inside a hook is converted into
/// [`HookError::Panicked`] by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
  /// The hook returned an error.
  #[error("{message}")]
  Failed { message: String },

  /// The hook panicked while running.
  #[error("hook panicked: {message}")]
  Panicked { message: String },
}

impl HookError {
  /// Create a hook failure.
  pub fn new(message: impl Into<String>) -> Self {
    Self::Failed {
      message: message.into(),
    }
  }

  /// Create an error describing a caught panic.
  pub fn panicked(message: impl Into<String>) -> Self {
    Self::Panicked {
      message: message.into(),
    }
  }
}

/// Which kind of author callback failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
  ShouldSkip,
  CanLeave,
  CanEnter,
  OnLeave,
  OnEnter,
  Actions,
  Guard,
  Effect,
  Navigation,
  Completion,
}

impl fmt::Display for HookPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      HookPhase::ShouldSkip => "should_skip",
      HookPhase::CanLeave => "can_leave",
      HookPhase::CanEnter => "can_enter",
      HookPhase::OnLeave => "on_leave",
      HookPhase::OnEnter => "on_enter",
      HookPhase::Actions => "actions",
      HookPhase::Guard => "guard",
      HookPhase::Effect => "effect",
      HookPhase::Navigation => "navigation",
      HookPhase::Completion => "completion",
    };
    f.write_str(name)
  }
}

/// A hard navigation failure, stored on the wizard context.
///
/// Once stored, the engine is in the `error` state. These errors are never
/// returned from navigation methods; callers read them from the context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
  /// A step guard or lifecycle hook failed.
  #[error("{phase} failed on step '{step_id}': {source}")]
  Step {
    step_id: String,
    phase: HookPhase,
    #[source]
    source: HookError,
  },

  /// An action guard, effect or custom navigation failed.
  #[error("action '{action}' {phase} failed on step '{step_id}': {source}")]
  Action {
    step_id: String,
    action: String,
    phase: HookPhase,
    #[source]
    source: HookError,
  },

  /// The completion callback failed.
  #[error("completion failed on step '{step_id}': {source}")]
  Completion {
    step_id: String,
    #[source]
    source: HookError,
  },
}

impl WizardError {
  /// The id of the step that was active when the failure happened.
  pub fn step_id(&self) -> &str {
    match self {
      WizardError::Step { step_id, .. }
      | WizardError::Action { step_id, .. }
      | WizardError::Completion { step_id, .. } => step_id,
    }
  }

  /// The phase in which the failure happened.
  pub fn phase(&self) -> HookPhase {
    match self {
      WizardError::Step { phase, .. } | WizardError::Action { phase, .. } => *phase,
      WizardError::Completion { .. } => HookPhase::Completion,
    }
  }
}

/// Errors raised when a wizard is configured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  /// The step list is empty.
  #[error("wizard has no steps")]
  NoSteps,

  /// Two steps share an id.
  #[error("duplicate step id: {step_id}")]
  DuplicateStepId { step_id: String },

  /// A skip predicate failed while the initial step was being chosen.
  #[error("initial skip resolution failed: {0}")]
  InitialSkip(#[source] WizardError),
}
