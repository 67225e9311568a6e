//! Action definitions.
//!
//! An [`Action`] is a named button on a step: guards decide whether it may
//! run, effects run in order, and a [`Navigation`] directive says where the
//! wizard goes afterwards.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::context::WizardContext;
use crate::engine::Wizard;
use crate::hook::{
  Guard, Hook, HookFuture, HookResult, WizardData, guard_from, guard_from_fn, hook_from,
  hook_from_fn,
};

/// Visual emphasis of an action button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionVariant {
  #[default]
  Primary,
  Secondary,
  Danger,
  Link,
}

/// Custom navigation callback. Receives the live wizard handle.
pub type CustomNavigation<D> = Arc<dyn Fn(Wizard<D>) -> HookFuture<()> + Send + Sync>;

/// Where the wizard goes after an action's effects have run.
pub enum Navigation<D> {
  /// Move to the next visible step.
  Advance,
  /// Move to the previous visible step.
  Retreat,
  /// Jump to the step with this id.
  GotoStep(String),
  /// Finish the wizard by running its completion callback.
  Complete,
  /// Run a callback with the wizard handle.
  Custom(CustomNavigation<D>),
}

impl<D: WizardData> Navigation<D> {
  pub fn goto(step_id: impl Into<String>) -> Self {
    Navigation::GotoStep(step_id.into())
  }

  pub fn custom<F, Fut>(f: F) -> Self
  where
    F: Fn(Wizard<D>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<()>> + Send + 'static,
  {
    Navigation::Custom(Arc::new(move |wizard| f(wizard).boxed()))
  }

  pub fn complete() -> Self {
    Navigation::Complete
  }
}

impl<D> Clone for Navigation<D> {
  fn clone(&self) -> Self {
    match self {
      Navigation::Advance => Navigation::Advance,
      Navigation::Retreat => Navigation::Retreat,
      Navigation::GotoStep(id) => Navigation::GotoStep(id.clone()),
      Navigation::Complete => Navigation::Complete,
      Navigation::Custom(f) => Navigation::Custom(Arc::clone(f)),
    }
  }
}

impl<D> fmt::Debug for Navigation<D> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Navigation::Advance => f.write_str("Advance"),
      Navigation::Retreat => f.write_str("Retreat"),
      Navigation::GotoStep(id) => f.debug_tuple("GotoStep").field(id).finish(),
      Navigation::Complete => f.write_str("Complete"),
      Navigation::Custom(_) => f.write_str("Custom(..)"),
    }
  }
}

/// A named action offered by a step.
pub struct Action<D> {
  pub(crate) key: String,
  pub(crate) label: String,
  pub(crate) icon: Option<String>,
  pub(crate) variant: ActionVariant,
  pub(crate) guards: Vec<Guard<D>>,
  pub(crate) effects: Vec<Hook<D>>,
  pub(crate) navigation: Option<Navigation<D>>,
}

impl<D: WizardData> Action<D> {
  pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      label: label.into(),
      icon: None,
      variant: ActionVariant::default(),
      guards: Vec::new(),
      effects: Vec::new(),
      navigation: None,
    }
  }

  pub fn label(mut self, label: impl Into<String>) -> Self {
    self.label = label.into();
    self
  }

  pub fn icon(mut self, icon: impl Into<String>) -> Self {
    self.icon = Some(icon.into());
    self
  }

  pub fn variant(mut self, variant: ActionVariant) -> Self {
    self.variant = variant;
    self
  }

  /// Append an asynchronous guard. Guards run in the order they are added.
  pub fn guard<F, Fut>(mut self, guard: F) -> Self
  where
    F: Fn(WizardContext<D>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<bool>> + Send + 'static,
  {
    self.guards.push(guard_from(guard));
    self
  }

  pub fn guard_fn<F>(mut self, guard: F) -> Self
  where
    F: Fn(&WizardContext<D>) -> bool + Send + Sync + 'static,
  {
    self.guards.push(guard_from_fn(guard));
    self
  }

  /// Append an asynchronous effect. Effects run in the order they are added.
  pub fn effect<F, Fut>(mut self, effect: F) -> Self
  where
    F: Fn(WizardContext<D>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<Option<D>>> + Send + 'static,
  {
    self.effects.push(hook_from(effect));
    self
  }

  pub fn effect_fn<F>(mut self, effect: F) -> Self
  where
    F: Fn(&WizardContext<D>) -> Option<D> + Send + Sync + 'static,
  {
    self.effects.push(hook_from_fn(effect));
    self
  }

  /// Append an effect that edits a copy of the current data bag.
  pub fn update<F>(self, update: F) -> Self
  where
    F: Fn(&mut D) + Send + Sync + 'static,
  {
    self.effect_fn(move |ctx| {
      let mut values = ctx.values().clone();
      update(&mut values);
      Some(values)
    })
  }

  pub fn navigate(mut self, navigation: Navigation<D>) -> Self {
    self.navigation = Some(navigation);
    self
  }

  pub fn navigate_custom<F, Fut>(self, f: F) -> Self
  where
    F: Fn(Wizard<D>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<()>> + Send + 'static,
  {
    self.navigate(Navigation::custom(f))
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn label_text(&self) -> &str {
    &self.label
  }

  pub fn icon_name(&self) -> Option<&str> {
    self.icon.as_deref()
  }

  pub fn variant_kind(&self) -> ActionVariant {
    self.variant
  }

  pub fn navigation(&self) -> Option<&Navigation<D>> {
    self.navigation.as_ref()
  }

  pub fn guard_count(&self) -> usize {
    self.guards.len()
  }

  pub fn effect_count(&self) -> usize {
    self.effects.len()
  }
}

impl<D> Clone for Action<D> {
  fn clone(&self) -> Self {
    Self {
      key: self.key.clone(),
      label: self.label.clone(),
      icon: self.icon.clone(),
      variant: self.variant,
      guards: self.guards.clone(),
      effects: self.effects.clone(),
      navigation: self.navigation.clone(),
    }
  }
}

impl<D> fmt::Debug for Action<D> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Action")
      .field("key", &self.key)
      .field("label", &self.label)
      .field("icon", &self.icon)
      .field("variant", &self.variant)
      .field("guards", &self.guards.len())
      .field("effects", &self.effects.len())
      .field("navigation", &self.navigation)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builder_collects_guards_and_effects_in_order() {
    let action = Action::<u32>::new("save", "Save")
      .icon("disk")
      .variant(ActionVariant::Secondary)
      .guard_fn(|_| true)
      .guard_fn(|_| false)
      .update(|n| *n += 1)
      .navigate(Navigation::Advance);

    assert_eq!(action.key(), "save");
    assert_eq!(action.label_text(), "Save");
    assert_eq!(action.icon_name(), Some("disk"));
    assert_eq!(action.variant_kind(), ActionVariant::Secondary);
    assert_eq!(action.guard_count(), 2);
    assert_eq!(action.effect_count(), 1);
    assert!(matches!(action.navigation(), Some(Navigation::Advance)));
  }

  #[test]
  fn test_navigation_debug() {
    let goto: Navigation<u32> = Navigation::goto("review");
    assert_eq!(format!("{:?}", goto), "GotoStep(\"review\")");
    assert_eq!(format!("{:?}", Navigation::<u32>::complete()), "Complete");
  }

  #[test]
  fn test_variant_serde_names() {
    let json = serde_json::to_string(&ActionVariant::Danger).unwrap();
    assert_eq!(json, "\"danger\"");
  }
}
