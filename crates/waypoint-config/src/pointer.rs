//! JSON pointer helpers (RFC 6901) over `serde_json::Value`.

use serde_json::{Map, Value};

use crate::error::PathError;

/// Split a pointer into unescaped reference tokens.
pub fn parse(path: &str) -> Result<Vec<String>, PathError> {
  let Some(rest) = path.strip_prefix('/') else {
    return Err(PathError::InvalidPointer {
      path: path.to_string(),
    });
  };

  Ok(
    rest
      .split('/')
      .map(|token| token.replace("~1", "/").replace("~0", "~"))
      .collect(),
  )
}

/// Check that `path` is a well-formed pointer.
pub fn validate(path: &str) -> Result<(), PathError> {
  parse(path).map(|_| ())
}

/// Look up the value at `path`. Missing values are `None`.
pub fn lookup<'a>(values: &'a Value, path: &str) -> Result<Option<&'a Value>, PathError> {
  validate(path)?;
  Ok(values.pointer(path))
}

/// Write `value` at `path`, creating intermediate objects.
///
/// Missing or null intermediates become objects. On arrays, a numeric token
/// within bounds replaces the element and `-` (or the length) appends.
pub fn set(values: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
  let tokens = parse(path)?;
  let Some((last, parents)) = tokens.split_last() else {
    return Err(PathError::InvalidPointer {
      path: path.to_string(),
    });
  };

  let mut current = values;
  for token in parents {
    if current.is_null() {
      *current = Value::Object(Map::new());
    }
    current = match current {
      Value::Object(map) => map
        .entry(token.clone())
        .or_insert_with(|| Value::Object(Map::new())),
      Value::Array(items) => {
        let index = array_index(path, token, items.len())?;
        items
          .get_mut(index)
          .ok_or_else(|| PathError::invalid_target(path, format!("index {index} out of range")))?
      }
      _ => return Err(PathError::invalid_target(path, format!("'{token}' has no parent object"))),
    };
  }

  if current.is_null() {
    *current = Value::Object(Map::new());
  }
  match current {
    Value::Object(map) => {
      map.insert(last.clone(), value);
      Ok(())
    }
    Value::Array(items) => {
      let len = items.len();
      let index = if last == "-" {
        len
      } else {
        array_index(path, last, len)?
      };
      if index < len {
        items[index] = value;
        Ok(())
      } else if index == len {
        items.push(value);
        Ok(())
      } else {
        Err(PathError::invalid_target(path, format!("index {index} out of range")))
      }
    }
    _ => Err(PathError::invalid_target(path, "parent is not an object or array")),
  }
}

/// Remove the value at `path`. Removing a missing value is a no-op.
pub fn remove(values: &mut Value, path: &str) -> Result<Option<Value>, PathError> {
  let tokens = parse(path)?;
  let Some((last, _)) = tokens.split_last() else {
    return Ok(None);
  };

  // Parent pointer is everything before the last '/'.
  let parent_path = &path[..path.rfind('/').unwrap_or(0)];
  let parent = if parent_path.is_empty() {
    Some(values)
  } else {
    values.pointer_mut(parent_path)
  };

  Ok(match parent {
    Some(Value::Object(map)) => map.remove(last),
    Some(Value::Array(items)) => match last.parse::<usize>() {
      Ok(index) if index < items.len() => Some(items.remove(index)),
      _ => None,
    },
    _ => None,
  })
}

fn array_index(path: &str, token: &str, len: usize) -> Result<usize, PathError> {
  if token == "-" {
    return Ok(len);
  }
  token
    .parse::<usize>()
    .map_err(|_| PathError::invalid_target(path, format!("'{token}' is not an array index")))
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
pub fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(items) => !items.is_empty(),
    Value::Object(map) => !map.is_empty(),
  }
}
