//! Render-only projection of the step list.
//!
//! Nothing here is a source of truth: the projection is recomputed from the
//! step list, the active step and the skip flags resolved for the current
//! data bag every time it is asked for.

use serde::{Deserialize, Serialize};

use crate::context::EngineState;
use crate::hook::WizardData;
use crate::step::Step;

/// Display status of one step indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
  Pending,
  Active,
  Completed,
  Skipped,
  Error,
  Disabled,
}

/// One step indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepUiConfig {
  pub id: String,
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub icon: Option<String>,
  pub status: StepStatus,
  pub clickable: bool,
}

/// Project the step list into indicator configs.
///
/// `skipped` holds one flag per step. Statuses compare raw step indices
/// against `active_index`; skipping never renumbers steps. Only completed
/// steps are clickable.
pub fn map_to_ui<D: WizardData>(
  steps: &[Step<D>],
  active_id: &str,
  active_index: usize,
  skipped: &[bool],
) -> Vec<StepUiConfig> {
  steps
    .iter()
    .enumerate()
    .map(|(index, step)| {
      let status = if skipped.get(index).copied().unwrap_or(false) {
        StepStatus::Skipped
      } else if step.id == active_id {
        StepStatus::Active
      } else if index < active_index {
        StepStatus::Completed
      } else {
        StepStatus::Pending
      };

      StepUiConfig {
        id: step.id.clone(),
        title: step.title.clone(),
        description: step.description.clone(),
        icon: step.icon.clone(),
        status,
        clickable: status == StepStatus::Completed,
      }
    })
    .collect()
}

/// Overlay the engine state on a projection.
///
/// In `error` the active indicator shows the failure. While `transitioning`
/// completed steps cannot be clicked.
pub fn apply_engine_state(ui: &mut [StepUiConfig], state: EngineState) {
  for config in ui.iter_mut() {
    match (state, config.status) {
      (EngineState::Error, StepStatus::Active) => {
        config.status = StepStatus::Error;
        config.clickable = false;
      }
      (EngineState::Transitioning, StepStatus::Completed) => {
        config.status = StepStatus::Disabled;
        config.clickable = false;
      }
      _ => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn steps() -> Vec<Step<bool>> {
    vec![
      Step::new("a", "A"),
      Step::new("b", "B"),
      Step::new("c", "C").skip_when(|skip_c: &bool| *skip_c),
      Step::new("d", "D").icon("flag"),
    ]
  }

  const SKIP_C: [bool; 4] = [false, false, true, false];
  const NONE_SKIPPED: [bool; 4] = [false; 4];

  fn statuses(ui: &[StepUiConfig]) -> Vec<StepStatus> {
    ui.iter().map(|config| config.status).collect()
  }

  #[test]
  fn test_statuses_from_raw_indices() {
    let ui = map_to_ui(&steps(), "d", 3, &SKIP_C);

    assert_eq!(
      statuses(&ui),
      vec![
        StepStatus::Completed,
        StepStatus::Completed,
        StepStatus::Skipped,
        StepStatus::Active,
      ]
    );
    assert_eq!(
      ui.iter().map(|c| c.clickable).collect::<Vec<_>>(),
      vec![true, true, false, false]
    );
    assert_eq!(ui[3].icon.as_deref(), Some("flag"));
  }

  #[test]
  fn test_pending_steps_are_not_clickable() {
    let ui = map_to_ui(&steps(), "b", 1, &NONE_SKIPPED);

    assert_eq!(
      statuses(&ui),
      vec![
        StepStatus::Completed,
        StepStatus::Active,
        StepStatus::Pending,
        StepStatus::Pending,
      ]
    );
    assert!(!ui[2].clickable);
    assert!(!ui[3].clickable);
  }

  #[test]
  fn test_error_state_marks_active_step() {
    let mut ui = map_to_ui(&steps(), "b", 1, &NONE_SKIPPED);
    apply_engine_state(&mut ui, EngineState::Error);

    assert_eq!(ui[1].status, StepStatus::Error);
    assert_eq!(ui[0].status, StepStatus::Completed);
  }

  #[test]
  fn test_transitioning_disables_completed_steps() {
    let mut ui = map_to_ui(&steps(), "b", 1, &NONE_SKIPPED);
    apply_engine_state(&mut ui, EngineState::Transitioning);

    assert_eq!(ui[0].status, StepStatus::Disabled);
    assert!(!ui[0].clickable);
    assert_eq!(ui[1].status, StepStatus::Active);
  }

  #[test]
  fn test_serialized_shape() {
    let ui = map_to_ui(&steps(), "a", 0, &NONE_SKIPPED);
    let json = serde_json::to_value(&ui[0]).unwrap();

    assert_eq!(
      json,
      serde_json::json!({
        "id": "a",
        "title": "A",
        "status": "active",
        "clickable": false
      })
    );
  }
}
