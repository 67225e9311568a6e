//! Wizard configuration and engine options.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::context::WizardContext;
use crate::hook::{CompletionHook, HookResult, WizardData};
use crate::step::Step;

/// What happens after a hard failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorRecovery {
  /// The error state is final.
  #[default]
  Terminal,
  /// `Wizard::reset` returns the engine to idle.
  Manual,
}

/// Engine behaviour knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
  #[serde(default)]
  pub error_recovery: ErrorRecovery,
}

/// Everything needed to build a [`Wizard`](crate::Wizard).
pub struct WizardConfig<D> {
  pub steps: Vec<Step<D>>,
  pub initial_values: D,
  pub on_complete: Option<CompletionHook<D>>,
  pub options: EngineOptions,
}

impl<D: WizardData> WizardConfig<D> {
  pub fn new(steps: Vec<Step<D>>, initial_values: D) -> Self {
    Self {
      steps,
      initial_values,
      on_complete: None,
      options: EngineOptions::default(),
    }
  }

  pub fn on_complete<F, Fut>(mut self, callback: F) -> Self
  where
    F: Fn(WizardContext<D>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<()>> + Send + 'static,
  {
    self.on_complete = Some(Arc::new(move |ctx| callback(ctx).boxed()));
    self
  }

  pub fn options(mut self, options: EngineOptions) -> Self {
    self.options = options;
    self
  }

  pub fn error_recovery(mut self, error_recovery: ErrorRecovery) -> Self {
    self.options.error_recovery = error_recovery;
    self
  }
}

impl<D: Clone> Clone for WizardConfig<D> {
  fn clone(&self) -> Self {
    Self {
      steps: self.steps.clone(),
      initial_values: self.initial_values.clone(),
      on_complete: self.on_complete.clone(),
      options: self.options.clone(),
    }
  }
}

impl<D> fmt::Debug for WizardConfig<D> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WizardConfig")
      .field("steps", &self.steps)
      .field("on_complete", &self.on_complete.is_some())
      .field("options", &self.options)
      .finish_non_exhaustive()
  }
}
