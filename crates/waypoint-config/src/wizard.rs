use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::step::StepDef;

/// What happens after a hard failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorRecovery {
  #[default]
  Terminal,
  Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardDef {
  pub wizard_id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default)]
  pub error_recovery: ErrorRecovery,
  /// Starting data bag. Defaults to an empty object.
  #[serde(default = "empty_object")]
  pub initial_values: Value,
  pub steps: Vec<StepDef>,
}

fn empty_object() -> Value {
  Value::Object(Default::default())
}
