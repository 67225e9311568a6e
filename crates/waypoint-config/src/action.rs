use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::effect::EffectDef;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionVariant {
  #[default]
  Primary,
  Secondary,
  Danger,
  Link,
}

/// Where the wizard goes after an action's effects ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationDef {
  Advance,
  Retreat,
  Goto { step_id: String },
  /// Run the wizard's completion.
  Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
  pub key: String,
  pub label: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub icon: Option<String>,
  #[serde(default)]
  pub variant: ActionVariant,
  /// All must hold, checked in order.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub guards: Vec<Condition>,
  /// Applied in order.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub effects: Vec<EffectDef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub navigation: Option<NavigationDef>,
}
