use serde::{Deserialize, Serialize};

use crate::action::ActionDef;
use crate::condition::Condition;
use crate::effect::EffectDef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDef {
  pub step_id: String,
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub icon: Option<String>,
  /// The step is hidden while this holds.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub skip_when: Option<Condition>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub can_enter: Option<Condition>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub can_leave: Option<Condition>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub on_enter: Vec<EffectDef>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub on_leave: Vec<EffectDef>,
  #[serde(default)]
  pub actions: Vec<ActionDef>,
}

impl StepDef {
  /// Every condition on the step and its actions.
  pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
    self
      .skip_when
      .iter()
      .chain(&self.can_enter)
      .chain(&self.can_leave)
      .chain(self.actions.iter().flat_map(|action| &action.guards))
  }

  /// Every effect on the step and its actions.
  pub fn effects(&self) -> impl Iterator<Item = &EffectDef> {
    self
      .on_enter
      .iter()
      .chain(&self.on_leave)
      .chain(self.actions.iter().flat_map(|action| &action.effects))
  }
}
