use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PathError;
use crate::pointer;

/// A declarative predicate over the JSON data bag.
///
/// Paths are JSON pointers. A missing path is falsy for `truthy` and never
/// equal to anything for `equals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
  /// The path is present (it may hold `null`).
  Exists { path: String },
  /// The value at the path is truthy.
  Truthy { path: String },
  /// The value at the path equals `value`.
  Equals { path: String, value: Value },
  Not { condition: Box<Condition> },
  /// Every condition holds. Empty is true.
  All { conditions: Vec<Condition> },
  /// At least one condition holds. Empty is false.
  Any { conditions: Vec<Condition> },
}

impl Condition {
  pub fn exists(path: impl Into<String>) -> Self {
    Condition::Exists { path: path.into() }
  }

  pub fn truthy(path: impl Into<String>) -> Self {
    Condition::Truthy { path: path.into() }
  }

  pub fn equals(path: impl Into<String>, value: Value) -> Self {
    Condition::Equals {
      path: path.into(),
      value,
    }
  }

  #[allow(clippy::should_implement_trait)]
  pub fn not(condition: Condition) -> Self {
    Condition::Not {
      condition: Box::new(condition),
    }
  }

  /// Evaluate against the data bag.
  pub fn evaluate(&self, values: &Value) -> Result<bool, PathError> {
    match self {
      Condition::Exists { path } => Ok(pointer::lookup(values, path)?.is_some()),
      Condition::Truthy { path } => Ok(pointer::lookup(values, path)?.is_some_and(pointer::is_truthy)),
      Condition::Equals { path, value } => Ok(pointer::lookup(values, path)? == Some(value)),
      Condition::Not { condition } => Ok(!condition.evaluate(values)?),
      Condition::All { conditions } => {
        for condition in conditions {
          if !condition.evaluate(values)? {
            return Ok(false);
          }
        }
        Ok(true)
      }
      Condition::Any { conditions } => {
        for condition in conditions {
          if condition.evaluate(values)? {
            return Ok(true);
          }
        }
        Ok(false)
      }
    }
  }

  /// Every pointer this condition reads.
  pub fn paths(&self) -> Vec<&str> {
    let mut paths = Vec::new();
    self.collect_paths(&mut paths);
    paths
  }

  fn collect_paths<'a>(&'a self, paths: &mut Vec<&'a str>) {
    match self {
      Condition::Exists { path } | Condition::Truthy { path } | Condition::Equals { path, .. } => {
        paths.push(path)
      }
      Condition::Not { condition } => condition.collect_paths(paths),
      Condition::All { conditions } | Condition::Any { conditions } => {
        for condition in conditions {
          condition.collect_paths(paths);
        }
      }
    }
  }

  /// Check every pointer without evaluating anything.
  pub fn validate(&self) -> Result<(), PathError> {
    self.paths().into_iter().try_for_each(pointer::validate)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn form() -> Value {
    json!({
      "location_type": "remote",
      "contact": { "email": "org@example.org", "phone": "" },
      "tags": []
    })
  }

  #[test]
  fn test_leaf_conditions() {
    let values = form();

    assert!(Condition::exists("/contact/phone").evaluate(&values).unwrap());
    assert!(!Condition::exists("/contact/fax").evaluate(&values).unwrap());
    assert!(Condition::truthy("/contact/email").evaluate(&values).unwrap());
    assert!(!Condition::truthy("/contact/phone").evaluate(&values).unwrap());
    assert!(!Condition::truthy("/tags").evaluate(&values).unwrap());
    assert!(!Condition::truthy("/missing").evaluate(&values).unwrap());
    assert!(
      Condition::equals("/location_type", json!("remote"))
        .evaluate(&values)
        .unwrap()
    );
    assert!(
      !Condition::equals("/missing", json!(null))
        .evaluate(&values)
        .unwrap()
    );
  }

  #[test]
  fn test_combinators() {
    let values = form();
    let remote = Condition::equals("/location_type", json!("remote"));
    let has_phone = Condition::truthy("/contact/phone");

    let all = Condition::All {
      conditions: vec![remote.clone(), Condition::not(has_phone.clone())],
    };
    let any = Condition::Any {
      conditions: vec![has_phone.clone(), Condition::exists("/tags")],
    };

    assert!(all.evaluate(&values).unwrap());
    assert!(any.evaluate(&values).unwrap());
    assert!(Condition::All { conditions: vec![] }.evaluate(&values).unwrap());
    assert!(!Condition::Any { conditions: vec![] }.evaluate(&values).unwrap());
  }

  #[test]
  fn test_bad_pointer_is_an_error() {
    let condition = Condition::not(Condition::truthy("contact.email"));
    assert_eq!(
      condition.evaluate(&form()),
      Err(PathError::InvalidPointer {
        path: "contact.email".to_string()
      })
    );
    assert!(condition.validate().is_err());
  }

  #[test]
  fn test_deserialize_tagged() {
    let condition: Condition = serde_json::from_value(json!({
      "op": "any",
      "conditions": [
        { "op": "equals", "path": "/location_type", "value": "remote" },
        { "op": "not", "condition": { "op": "exists", "path": "/address" } }
      ]
    }))
    .unwrap();

    assert_eq!(condition.paths(), vec!["/location_type", "/address"]);
    assert!(condition.evaluate(&form()).unwrap());
  }
}
