//! Step definitions.
//!
//! A [`Step`] is one stage of a wizard. Its identity and display metadata are
//! static; its behaviour is a set of optional callbacks whose *results* vary
//! with the data bag:
//!
//! - `skip_when` / `skip_when_async`: skip predicate over the data bag
//! - `can_leave` / `can_enter`: transition guards
//! - `on_leave` / `on_enter`: lifecycle hooks that may replace the data bag
//! - `actions`: produces the step's available actions from the current context
//!
//! Absent guards allow the transition, absent skip predicates keep the step
//! visible.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::action::Action;
use crate::context::WizardContext;
use crate::hook::{
  Guard, Hook, HookResult, SkipPredicate, WizardData, guard_from, guard_from_fn, hook_from,
  hook_from_fn, invoke, skip_from, skip_from_fn,
};

/// Produces the actions available on a step.
pub type ActionsProvider<D> = Arc<dyn Fn(&WizardContext<D>) -> Vec<Action<D>> + Send + Sync>;

/// A single wizard step.
pub struct Step<D> {
  pub(crate) id: String,
  pub(crate) title: String,
  pub(crate) description: Option<String>,
  pub(crate) icon: Option<String>,
  pub(crate) should_skip: Option<SkipPredicate<D>>,
  pub(crate) can_enter: Option<Guard<D>>,
  pub(crate) can_leave: Option<Guard<D>>,
  pub(crate) on_enter: Option<Hook<D>>,
  pub(crate) on_leave: Option<Hook<D>>,
  pub(crate) actions: Option<ActionsProvider<D>>,
}

impl<D: WizardData> Step<D> {
  /// Create a step with no behaviour attached.
  pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      title: title.into(),
      description: None,
      icon: None,
      should_skip: None,
      can_enter: None,
      can_leave: None,
      on_enter: None,
      on_leave: None,
      actions: None,
    }
  }

  pub fn description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn icon(mut self, icon: impl Into<String>) -> Self {
    self.icon = Some(icon.into());
    self
  }

  /// Skip this step whenever the predicate holds for the current data bag.
  pub fn skip_when<F>(mut self, predicate: F) -> Self
  where
    F: Fn(&D) -> bool + Send + Sync + 'static,
  {
    self.should_skip = Some(skip_from_fn(predicate));
    self
  }

  /// Asynchronous form of [`Step::skip_when`]. An `Err` is a hard failure.
  pub fn skip_when_async<F, Fut>(mut self, predicate: F) -> Self
  where
    F: Fn(Arc<D>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<bool>> + Send + 'static,
  {
    self.should_skip = Some(skip_from(predicate));
    self
  }

  /// Asynchronous guard checked before this step becomes active.
  pub fn can_enter<F, Fut>(mut self, guard: F) -> Self
  where
    F: Fn(WizardContext<D>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<bool>> + Send + 'static,
  {
    self.can_enter = Some(guard_from(guard));
    self
  }

  /// Synchronous form of [`Step::can_enter`].
  pub fn can_enter_fn<F>(mut self, guard: F) -> Self
  where
    F: Fn(&WizardContext<D>) -> bool + Send + Sync + 'static,
  {
    self.can_enter = Some(guard_from_fn(guard));
    self
  }

  /// Asynchronous guard checked before moving forward off this step.
  ///
  /// Backward movement never consults it.
  pub fn can_leave<F, Fut>(mut self, guard: F) -> Self
  where
    F: Fn(WizardContext<D>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<bool>> + Send + 'static,
  {
    self.can_leave = Some(guard_from(guard));
    self
  }

  /// Synchronous form of [`Step::can_leave`].
  pub fn can_leave_fn<F>(mut self, guard: F) -> Self
  where
    F: Fn(&WizardContext<D>) -> bool + Send + Sync + 'static,
  {
    self.can_leave = Some(guard_from_fn(guard));
    self
  }

  pub fn on_enter<F, Fut>(mut self, hook: F) -> Self
  where
    F: Fn(WizardContext<D>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<Option<D>>> + Send + 'static,
  {
    self.on_enter = Some(hook_from(hook));
    self
  }

  pub fn on_enter_fn<F>(mut self, hook: F) -> Self
  where
    F: Fn(&WizardContext<D>) -> Option<D> + Send + Sync + 'static,
  {
    self.on_enter = Some(hook_from_fn(hook));
    self
  }

  pub fn on_leave<F, Fut>(mut self, hook: F) -> Self
  where
    F: Fn(WizardContext<D>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<Option<D>>> + Send + 'static,
  {
    self.on_leave = Some(hook_from(hook));
    self
  }

  pub fn on_leave_fn<F>(mut self, hook: F) -> Self
  where
    F: Fn(&WizardContext<D>) -> Option<D> + Send + Sync + 'static,
  {
    self.on_leave = Some(hook_from_fn(hook));
    self
  }

  /// Compute the step's actions from the current context.
  pub fn actions<F>(mut self, provider: F) -> Self
  where
    F: Fn(&WizardContext<D>) -> Vec<Action<D>> + Send + Sync + 'static,
  {
    self.actions = Some(Arc::new(provider));
    self
  }

  /// Attach a fixed list of actions.
  pub fn with_actions(self, actions: Vec<Action<D>>) -> Self {
    self.actions(move |_| actions.clone())
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn description_text(&self) -> Option<&str> {
    self.description.as_deref()
  }

  pub fn icon_name(&self) -> Option<&str> {
    self.icon.as_deref()
  }

  /// Evaluate the skip predicate against `values`. Panics are caught.
  pub async fn resolve_skip(&self, values: &Arc<D>) -> HookResult<bool> {
    match &self.should_skip {
      None => Ok(false),
      Some(should_skip) => invoke(|| should_skip(Arc::clone(values))).await,
    }
  }

  /// The actions this step offers for the given context.
  pub fn actions_for(&self, ctx: &WizardContext<D>) -> Vec<Action<D>> {
    self
      .actions
      .as_ref()
      .map(|provider| provider(ctx))
      .unwrap_or_default()
  }
}

impl<D> Clone for Step<D> {
  fn clone(&self) -> Self {
    Self {
      id: self.id.clone(),
      title: self.title.clone(),
      description: self.description.clone(),
      icon: self.icon.clone(),
      should_skip: self.should_skip.clone(),
      can_enter: self.can_enter.clone(),
      can_leave: self.can_leave.clone(),
      on_enter: self.on_enter.clone(),
      on_leave: self.on_leave.clone(),
      actions: self.actions.clone(),
    }
  }
}

// Callbacks are not Debug; report which ones are present.
impl<D> fmt::Debug for Step<D> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Step")
      .field("id", &self.id)
      .field("title", &self.title)
      .field("description", &self.description)
      .field("icon", &self.icon)
      .field("skip_when", &self.should_skip.is_some())
      .field("can_enter", &self.can_enter.is_some())
      .field("can_leave", &self.can_leave.is_some())
      .field("on_enter", &self.on_enter.is_some())
      .field("on_leave", &self.on_leave.is_some())
      .field("actions", &self.actions.is_some())
      .finish()
  }
}
