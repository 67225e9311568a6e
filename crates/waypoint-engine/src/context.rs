//! The context surface handed to hooks and consumers.
//!
//! A [`WizardContext`] is an immutable snapshot. The engine builds a new one
//! from its shared holder right before every hook call, so a hook always sees
//! the state as of the moment it was invoked. Visible steps and progress are
//! derived from the skip flags the engine resolved for the snapshot's data
//! bag.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::WizardError;
use crate::hook::WizardData;
use crate::navigation::Navigator;
use crate::step::Step;
use crate::ui::{StepUiConfig, apply_engine_state, map_to_ui};

/// Engine state machine position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
  #[default]
  Idle,
  Transitioning,
  Error,
}

impl fmt::Display for EngineState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EngineState::Idle => f.write_str("idle"),
      EngineState::Transitioning => f.write_str("transitioning"),
      EngineState::Error => f.write_str("error"),
    }
  }
}

/// A snapshot of the wizard at one instant.
pub struct WizardContext<D> {
  steps: Arc<[Step<D>]>,
  active_step_index: usize,
  visible_steps: Vec<String>,
  skipped: Arc<[bool]>,
  values: Arc<D>,
  state: EngineState,
  error: Option<WizardError>,
  progress_percent: u8,
}

impl<D: WizardData> WizardContext<D> {
  pub(crate) fn new(
    steps: Arc<[Step<D>]>,
    active_step_index: usize,
    values: Arc<D>,
    skipped: Arc<[bool]>,
    state: EngineState,
    error: Option<WizardError>,
  ) -> Self {
    let navigator = Navigator::new(&steps, &skipped);
    let visible_steps = navigator.visible_step_ids();
    let progress_percent = navigator.progress(active_step_index);

    Self {
      steps,
      active_step_index,
      visible_steps,
      skipped,
      values,
      state,
      error,
      progress_percent,
    }
  }

  pub fn steps(&self) -> &[Step<D>] {
    &self.steps
  }

  pub fn active_step(&self) -> &Step<D> {
    &self.steps[self.active_step_index]
  }

  pub fn active_step_id(&self) -> &str {
    &self.active_step().id
  }

  pub fn active_step_index(&self) -> usize {
    self.active_step_index
  }

  /// Ids of the steps that are currently not skipped.
  pub fn visible_steps(&self) -> &[String] {
    &self.visible_steps
  }

  /// Whether the step at `index` is skipped in this snapshot.
  pub fn is_skipped(&self, index: usize) -> bool {
    self.skipped.get(index).copied().unwrap_or(true)
  }

  pub fn values(&self) -> &D {
    &self.values
  }

  pub fn shared_values(&self) -> Arc<D> {
    Arc::clone(&self.values)
  }

  pub fn state(&self) -> EngineState {
    self.state
  }

  pub fn error(&self) -> Option<&WizardError> {
    self.error.as_ref()
  }

  pub fn progress_percent(&self) -> u8 {
    self.progress_percent
  }

  /// Actions the active step offers in this snapshot.
  pub fn actions(&self) -> Vec<Action<D>> {
    self.active_step().actions_for(self)
  }

  /// Step indicators for this snapshot, with the engine state applied.
  pub fn step_ui(&self) -> Vec<StepUiConfig> {
    let mut ui = map_to_ui(
      &self.steps,
      self.active_step_id(),
      self.active_step_index,
      &self.skipped,
    );
    apply_engine_state(&mut ui, self.state);
    ui
  }

  /// Serializable summary, without the data bag.
  pub fn snapshot(&self) -> ContextSnapshot {
    ContextSnapshot {
      active_step: self.active_step_id().to_string(),
      active_step_index: self.active_step_index,
      visible_steps: self.visible_steps.clone(),
      progress_percent: self.progress_percent,
      state: self.state,
      error: self.error.as_ref().map(ToString::to_string),
    }
  }
}

impl<D> Clone for WizardContext<D> {
  fn clone(&self) -> Self {
    Self {
      steps: Arc::clone(&self.steps),
      active_step_index: self.active_step_index,
      visible_steps: self.visible_steps.clone(),
      skipped: Arc::clone(&self.skipped),
      values: Arc::clone(&self.values),
      state: self.state,
      error: self.error.clone(),
      progress_percent: self.progress_percent,
    }
  }
}

impl<D> fmt::Debug for WizardContext<D> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WizardContext")
      .field("active_step_index", &self.active_step_index)
      .field("visible_steps", &self.visible_steps)
      .field("state", &self.state)
      .field("error", &self.error)
      .field("progress_percent", &self.progress_percent)
      .finish_non_exhaustive()
  }
}

/// Serializable view of a [`WizardContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
  pub active_step: String,
  pub active_step_index: usize,
  pub visible_steps: Vec<String>,
  pub progress_percent: u8,
  pub state: EngineState,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::StepStatus;

  fn steps() -> Arc<[Step<bool>]> {
    vec![
      Step::new("a", "A"),
      Step::new("b", "B").skip_when(|skip_b: &bool| *skip_b),
      Step::new("c", "C").with_actions(vec![Action::new("next", "Next")]),
    ]
    .into()
  }

  fn context(active: usize, skip_b: bool, state: EngineState) -> WizardContext<bool> {
    let skipped: Arc<[bool]> = vec![false, skip_b, false].into();
    WizardContext::new(steps(), active, Arc::new(skip_b), skipped, state, None)
  }

  #[test]
  fn test_derived_fields_follow_skip_flags() {
    let ctx = context(0, true, EngineState::Idle);
    assert_eq!(ctx.visible_steps(), ["a", "c"]);
    assert_eq!(ctx.progress_percent(), 50);
    assert!(ctx.is_skipped(1));

    let ctx = context(0, false, EngineState::Idle);
    assert_eq!(ctx.visible_steps(), ["a", "b", "c"]);
    assert_eq!(ctx.progress_percent(), 33);
    assert!(!ctx.is_skipped(1));
  }

  #[test]
  fn test_actions_come_from_active_step() {
    let ctx = context(0, false, EngineState::Idle);
    assert!(ctx.actions().is_empty());

    let ctx = context(2, false, EngineState::Idle);
    let keys: Vec<_> = ctx.actions().iter().map(|a| a.key().to_string()).collect();
    assert_eq!(keys, vec!["next"]);
  }

  #[test]
  fn test_step_ui_applies_engine_state() {
    let ctx = context(2, false, EngineState::Error);
    let ui = ctx.step_ui();
    assert_eq!(ui[2].status, StepStatus::Error);
    assert_eq!(ui[0].status, StepStatus::Completed);
  }

  #[test]
  fn test_snapshot_serializes_state() {
    let ctx = context(2, true, EngineState::Idle);
    let json = serde_json::to_value(ctx.snapshot()).unwrap();

    assert_eq!(
      json,
      serde_json::json!({
        "active_step": "c",
        "active_step_index": 2,
        "visible_steps": ["a", "c"],
        "progress_percent": 100,
        "state": "idle"
      })
    );
  }
}
