//! Line-oriented command scripts for `waypoint run`.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::Value;

use waypoint_config::pointer;
use waypoint_engine::{ContextSnapshot, NavOutcome, Wizard};

/// One scripted command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
  Next,
  Back,
  Goto(String),
  Action(String),
  Set { path: String, value: Value },
  Show,
  Reset,
}

/// What gets printed after each command.
#[derive(Debug, Serialize)]
pub struct CommandOutput {
  pub command: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub outcome: Option<NavOutcome>,
  pub snapshot: ContextSnapshot,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub values: Option<Value>,
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
  let line = line.trim();
  if line.is_empty() || line.starts_with('#') {
    return Ok(None);
  }

  let (name, rest) = match line.split_once(char::is_whitespace) {
    Some((name, rest)) => (name, rest.trim()),
    None => (line, ""),
  };

  let command = match (name, rest) {
    ("next", "") => Command::Next,
    ("back", "") => Command::Back,
    ("show", "") => Command::Show,
    ("reset", "") => Command::Reset,
    ("goto", step_id) if !step_id.is_empty() => Command::Goto(step_id.to_string()),
    ("action", key) if !key.is_empty() => Command::Action(key.to_string()),
    ("set", args) => {
      let Some((path, raw)) = args.split_once(char::is_whitespace) else {
        bail!("usage: set <pointer> <json>");
      };
      pointer::validate(path)?;
      let value = serde_json::from_str(raw.trim())
        .with_context(|| format!("invalid JSON value for {path}: {raw}"))?;
      Command::Set {
        path: path.to_string(),
        value,
      }
    }
    ("next" | "back" | "show" | "reset", _) => bail!("'{name}' takes no arguments"),
    ("goto" | "action", _) => bail!("'{name}' needs an argument"),
    _ => bail!("unknown command: {name}"),
  };

  Ok(Some(command))
}

impl Command {
  /// Run the command and describe the result.
  pub async fn execute(&self, wizard: &Wizard<Value>) -> Result<CommandOutput> {
    let mut values = None;
    let outcome = match self {
      Command::Next => Some(wizard.go_next().await),
      Command::Back => Some(wizard.go_back().await),
      Command::Goto(step_id) => Some(wizard.goto(step_id).await),
      Command::Action(key) => Some(wizard.run_action(key).await),
      Command::Set { path, value } => {
        let mut updated = Value::clone(&wizard.values());
        pointer::set(&mut updated, path, value.clone())?;
        Some(wizard.set_values(updated).await)
      }
      Command::Show => {
        values = Some(Value::clone(&wizard.values()));
        None
      }
      Command::Reset => Some(if wizard.reset() {
        NavOutcome::Applied
      } else {
        NavOutcome::Dropped
      }),
    };

    Ok(CommandOutput {
      command: self.to_string(),
      outcome,
      snapshot: wizard.context().snapshot(),
      values,
    })
  }
}

impl std::fmt::Display for Command {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Command::Next => write!(f, "next"),
      Command::Back => write!(f, "back"),
      Command::Goto(step_id) => write!(f, "goto {step_id}"),
      Command::Action(key) => write!(f, "action {key}"),
      Command::Set { path, value } => write!(f, "set {path} {value}"),
      Command::Show => write!(f, "show"),
      Command::Reset => write!(f, "reset"),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_parse_commands() {
    assert_eq!(parse_line("next").unwrap(), Some(Command::Next));
    assert_eq!(parse_line("  back  ").unwrap(), Some(Command::Back));
    assert_eq!(
      parse_line("goto review").unwrap(),
      Some(Command::Goto("review".to_string()))
    );
    assert_eq!(
      parse_line("action save_draft").unwrap(),
      Some(Command::Action("save_draft".to_string()))
    );
    assert_eq!(
      parse_line(r#"set /contact/email "a@b.org""#).unwrap(),
      Some(Command::Set {
        path: "/contact/email".to_string(),
        value: json!("a@b.org"),
      })
    );
    assert_eq!(
      parse_line(r#"set /address {"city": "Porto"}"#).unwrap(),
      Some(Command::Set {
        path: "/address".to_string(),
        value: json!({"city": "Porto"}),
      })
    );
  }

  #[test]
  fn test_comments_and_blank_lines() {
    assert_eq!(parse_line("").unwrap(), None);
    assert_eq!(parse_line("   ").unwrap(), None);
    assert_eq!(parse_line("# fill the basics").unwrap(), None);
  }

  #[test]
  fn test_parse_errors() {
    assert!(parse_line("jump").is_err());
    assert!(parse_line("goto").is_err());
    assert!(parse_line("next now").is_err());
    assert!(parse_line("set /title").is_err());
    assert!(parse_line("set title \"x\"").is_err());
    assert!(parse_line("set /title not-json").is_err());
  }

  #[test]
  fn test_display_round_trips_through_parser() {
    let command = Command::Set {
      path: "/count".to_string(),
      value: json!(3),
    };
    assert_eq!(command.to_string(), "set /count 3");
    assert_eq!(parse_line(&command.to_string()).unwrap(), Some(command));
  }
}
