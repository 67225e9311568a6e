//! The wizard state machine.
//!
//! [`Wizard`] owns the active step index, the data bag and the engine state in
//! a single shared holder. Every hook invocation builds a fresh
//! [`WizardContext`] from that holder, and every data replacement is written
//! back to it before the next hook runs.
//!
//! The holder also keeps the skip flags resolved for the current data bag.
//! Every data bag replacement resolves them again before it is committed, so
//! synchronous readers never see flags from an older data bag.
//!
//! Re-entrancy: a call that arrives while another is in flight returns
//! [`NavOutcome::Dropped`] without touching the holder.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::action::{Action, Navigation};
use crate::config::{EngineOptions, ErrorRecovery, WizardConfig};
use crate::context::{EngineState, WizardContext};
use crate::error::{ConfigError, HookError, HookPhase, WizardError};
use crate::events::{LifecyclePhase, NoopNotifier, WizardEvent, WizardNotifier};
use crate::hook::{CompletionHook, Guard, Hook, HookResult, WizardData, invoke, invoke_sync};
use crate::navigation::{Navigator, resolve_skips};
use crate::pipeline::{ActionPipeline, PipelineOutcome};
use crate::step::Step;

/// What a navigation call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavOutcome {
  /// The active step changed.
  Moved,
  /// A `can_leave` or `can_enter` guard resolved false.
  Blocked,
  /// There is no visible step in the requested direction.
  NoMovement,
  /// Unknown step id or action key.
  NotFound,
  /// Another call was in flight, or the engine is in the error state.
  Dropped,
  /// An action guard resolved false. No effects ran.
  Aborted,
  /// A data change was stored, or an action ran and its navigation, if any,
  /// did not move the wizard by itself.
  Applied,
  /// The completion callback ran.
  Completed,
  /// A hook failed; the error is on the context.
  Failed,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
  Forward,
  Backward,
  To(usize),
}

impl Direction {
  fn checks_leave(self) -> bool {
    !matches!(self, Direction::Backward)
  }
}

struct Machine<D> {
  active_index: usize,
  values: Arc<D>,
  skipped: Arc<[bool]>,
  state: EngineState,
  error: Option<WizardError>,
}

pub(crate) struct Shared<D> {
  instance_id: String,
  steps: Arc<[Step<D>]>,
  on_complete: Option<CompletionHook<D>>,
  options: EngineOptions,
  machine: Mutex<Machine<D>>,
  notifier: Arc<dyn WizardNotifier>,
  seq: AtomicU64,
}

/// Handle to a running wizard. Clones share the same state.
pub struct Wizard<D> {
  shared: Arc<Shared<D>>,
}

impl<D> Clone for Wizard<D> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<D> fmt::Debug for Wizard<D> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Wizard")
      .field("instance_id", &self.shared.instance_id)
      .field("steps", &self.shared.steps.len())
      .finish_non_exhaustive()
  }
}

impl<D: WizardData> Wizard<D> {
  /// Build a wizard that discards lifecycle events.
  ///
  /// Skip predicates are resolved against the initial values to pick the
  /// first visible step.
  pub async fn new(config: WizardConfig<D>) -> Result<Self, ConfigError> {
    Self::with_notifier(config, NoopNotifier).await
  }

  /// Build a wizard that reports lifecycle events to `notifier`.
  pub async fn with_notifier(
    config: WizardConfig<D>,
    notifier: impl WizardNotifier + 'static,
  ) -> Result<Self, ConfigError> {
    let WizardConfig {
      steps,
      initial_values,
      on_complete,
      options,
    } = config;

    if steps.is_empty() {
      return Err(ConfigError::NoSteps);
    }
    for (index, step) in steps.iter().enumerate() {
      if steps[..index].iter().any(|earlier| earlier.id == step.id) {
        return Err(ConfigError::DuplicateStepId {
          step_id: step.id.clone(),
        });
      }
    }

    let values = Arc::new(initial_values);
    let skipped: Arc<[bool]> = resolve_skips(&steps, &values)
      .await
      .map_err(ConfigError::InitialSkip)?
      .into();
    let active_index = Navigator::new(&steps, &skipped)
      .first_visible()
      .unwrap_or(0);

    let instance_id = uuid::Uuid::new_v4().to_string();
    debug!(
      instance_id = %instance_id,
      steps = steps.len(),
      active_step = %steps[active_index].id,
      "wizard_created"
    );

    Ok(Self {
      shared: Arc::new(Shared {
        instance_id,
        steps: steps.into(),
        on_complete,
        options,
        machine: Mutex::new(Machine {
          active_index,
          values,
          skipped,
          state: EngineState::Idle,
          error: None,
        }),
        notifier: Arc::new(notifier),
        seq: AtomicU64::new(0),
      }),
    })
  }

  pub fn instance_id(&self) -> &str {
    &self.shared.instance_id
  }

  pub fn options(&self) -> &EngineOptions {
    &self.shared.options
  }

  /// A fresh snapshot of the current state.
  pub fn context(&self) -> WizardContext<D> {
    self.shared.context()
  }

  pub fn values(&self) -> Arc<D> {
    Arc::clone(&self.shared.machine().values)
  }

  pub fn state(&self) -> EngineState {
    self.shared.machine().state
  }

  pub fn error(&self) -> Option<WizardError> {
    self.shared.machine().error.clone()
  }

  /// Actions offered by the active step right now.
  pub fn actions(&self) -> Vec<Action<D>> {
    self.context().actions()
  }

  /// Replace the data bag.
  ///
  /// Only accepted while idle; otherwise the call is dropped. Skip
  /// predicates are resolved against the new values before they are stored,
  /// and a failing predicate is a hard failure that leaves the old values in
  /// place. The active step does not move.
  #[instrument(
    name = "wizard_set_values",
    skip(self, values),
    fields(instance_id = %self.shared.instance_id)
  )]
  pub async fn set_values(&self, values: D) -> NavOutcome {
    if !self.shared.try_begin("set_values") {
      return NavOutcome::Dropped;
    }

    match self.shared.commit_values(values).await {
      Ok(()) => {
        self.shared.finish();
        NavOutcome::Applied
      }
      Err(e) => {
        self.shared.fail(e);
        NavOutcome::Failed
      }
    }
  }

  /// Edit a copy of the data bag as of this call and store it through
  /// [`Wizard::set_values`].
  pub async fn update_values(&self, update: impl FnOnce(&mut D)) -> NavOutcome {
    let mut values = D::clone(&self.values());
    update(&mut values);
    self.set_values(values).await
  }

  /// Move to the next visible step.
  #[instrument(
    name = "wizard_go_next",
    skip(self),
    fields(instance_id = %self.shared.instance_id)
  )]
  pub async fn go_next(&self) -> NavOutcome {
    self.shared.navigate("go_next", Direction::Forward).await
  }

  /// Move to the previous visible step. `can_leave` is not consulted.
  #[instrument(
    name = "wizard_go_back",
    skip(self),
    fields(instance_id = %self.shared.instance_id)
  )]
  pub async fn go_back(&self) -> NavOutcome {
    self.shared.navigate("go_back", Direction::Backward).await
  }

  /// Jump to the step with the given id, checking both guards.
  #[instrument(
    name = "wizard_goto",
    skip(self),
    fields(instance_id = %self.shared.instance_id)
  )]
  pub async fn goto(&self, step_id: &str) -> NavOutcome {
    let Some(target) = self.shared.steps.iter().position(|step| step.id == step_id) else {
      warn!(
        instance_id = %self.shared.instance_id,
        step_id = %step_id,
        "goto target not found"
      );
      return NavOutcome::NotFound;
    };

    self.shared.navigate("goto", Direction::To(target)).await
  }

  /// Run the active step's action with the given key.
  ///
  /// Guards and effects run while the engine is transitioning. The engine is
  /// idle again before the navigation directive is dispatched.
  #[instrument(
    name = "wizard_run_action",
    skip(self),
    fields(instance_id = %self.shared.instance_id)
  )]
  pub async fn run_action(&self, key: &str) -> NavOutcome {
    if !self.shared.try_begin("run_action") {
      return NavOutcome::Dropped;
    }

    let ctx = self.context();
    let step_id = ctx.active_step_id().to_string();
    let available = match invoke_sync(|| ctx.actions()) {
      Ok(available) => available,
      Err(source) => {
        self.shared.fail(WizardError::Step {
          step_id,
          phase: HookPhase::Actions,
          source,
        });
        return NavOutcome::Failed;
      }
    };

    let Some(action) = available.into_iter().find(|action| action.key == key) else {
      self.shared.finish();
      warn!(
        instance_id = %self.shared.instance_id,
        step_id = %step_id,
        action = %key,
        "action not found"
      );
      return NavOutcome::NotFound;
    };

    let navigation = match ActionPipeline::new(&self.shared, &step_id, action)
      .execute()
      .await
    {
      Ok(PipelineOutcome::Aborted) => {
        self.shared.finish();
        return NavOutcome::Aborted;
      }
      Ok(PipelineOutcome::Proceed(navigation)) => {
        self.shared.finish();
        self
          .shared
          .emit(&step_id, LifecyclePhase::ActionCompleted, Some(key.to_string()));
        navigation
      }
      Err(e) => {
        self.shared.fail(e);
        return NavOutcome::Failed;
      }
    };

    match navigation {
      None => NavOutcome::Applied,
      Some(Navigation::Advance) => self.go_next().await,
      Some(Navigation::Retreat) => self.go_back().await,
      Some(Navigation::GotoStep(target)) => self.goto(&target).await,
      Some(Navigation::Complete) => self.complete().await,
      Some(Navigation::Custom(custom)) => {
        let wizard = self.clone();
        match invoke(|| custom(wizard)).await {
          Ok(()) if self.state() == EngineState::Error => NavOutcome::Failed,
          Ok(()) => NavOutcome::Applied,
          Err(source) => {
            self.shared.fail(WizardError::Action {
              step_id,
              action: key.to_string(),
              phase: HookPhase::Navigation,
              source,
            });
            NavOutcome::Failed
          }
        }
      }
    }
  }

  /// Run the completion callback.
  #[instrument(
    name = "wizard_complete",
    skip(self),
    fields(instance_id = %self.shared.instance_id)
  )]
  pub async fn complete(&self) -> NavOutcome {
    if !self.shared.try_begin("complete") {
      return NavOutcome::Dropped;
    }

    let step_id = self.shared.active_step_id();
    if let Some(on_complete) = self.shared.on_complete.clone() {
      let ctx = self.context();
      if let Err(source) = invoke(|| on_complete(ctx)).await {
        self.shared.fail(WizardError::Completion { step_id, source });
        return NavOutcome::Failed;
      }
    }

    self.shared.finish();
    self.shared.emit(&step_id, LifecyclePhase::Completed, None);
    info!(
      instance_id = %self.shared.instance_id,
      step_id = %step_id,
      "wizard_completed"
    );
    NavOutcome::Completed
  }

  /// Leave the error state. Only available with [`ErrorRecovery::Manual`].
  ///
  /// The active step and data bag are kept; only the state and error are
  /// cleared.
  pub fn reset(&self) -> bool {
    if self.shared.options.error_recovery != ErrorRecovery::Manual {
      warn!(
        instance_id = %self.shared.instance_id,
        "reset requires manual error recovery"
      );
      return false;
    }

    let mut machine = self.shared.machine();
    if machine.state != EngineState::Error {
      return false;
    }
    machine.state = EngineState::Idle;
    machine.error = None;
    info!(instance_id = %self.shared.instance_id, "wizard_reset");
    true
  }
}

impl<D: WizardData> Shared<D> {
  fn machine(&self) -> MutexGuard<'_, Machine<D>> {
    self.machine.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub(crate) fn context(&self) -> WizardContext<D> {
    let machine = self.machine();
    WizardContext::new(
      Arc::clone(&self.steps),
      machine.active_index,
      Arc::clone(&machine.values),
      Arc::clone(&machine.skipped),
      machine.state,
      machine.error.clone(),
    )
  }

  fn active_index(&self) -> usize {
    self.machine().active_index
  }

  fn active_step_id(&self) -> String {
    self.steps[self.active_index()].id.clone()
  }

  pub(crate) fn emit(&self, step_id: &str, phase: LifecyclePhase, detail: Option<String>) {
    self.notifier.notify(WizardEvent {
      seq: self.seq.fetch_add(1, Ordering::SeqCst),
      instance_id: self.instance_id.clone(),
      step_id: step_id.to_string(),
      phase,
      detail,
      timestamp: Utc::now(),
    });
  }

  /// Enter `transitioning` if idle. Otherwise record the dropped call.
  fn try_begin(&self, operation: &str) -> bool {
    let (began, state, active_index) = {
      let mut machine = self.machine();
      let state = machine.state;
      if state == EngineState::Idle {
        machine.state = EngineState::Transitioning;
      }
      (state == EngineState::Idle, state, machine.active_index)
    };

    if !began {
      let step_id = &self.steps[active_index].id;
      debug!(
        instance_id = %self.instance_id,
        step_id = %step_id,
        operation = %operation,
        state = %state,
        "call dropped"
      );
      self.emit(step_id, LifecyclePhase::Dropped, Some(operation.to_string()));
    }
    began
  }

  pub(crate) fn finish(&self) {
    let mut machine = self.machine();
    if machine.state == EngineState::Transitioning {
      machine.state = EngineState::Idle;
    }
  }

  pub(crate) fn fail(&self, error: WizardError) {
    error!(
      instance_id = %self.instance_id,
      step_id = %error.step_id(),
      phase = %error.phase(),
      error = %error,
      "wizard_failed"
    );
    let step_id = error.step_id().to_string();
    let message = error.to_string();
    {
      let mut machine = self.machine();
      machine.state = EngineState::Error;
      machine.error = Some(error);
    }
    self.emit(&step_id, LifecyclePhase::Failed, Some(message));
  }

  /// Resolve skip flags for `values`, then store both together.
  pub(crate) async fn commit_values(&self, values: D) -> Result<(), WizardError> {
    let values = Arc::new(values);
    let skipped = resolve_skips(&self.steps, &values).await?;

    let mut machine = self.machine();
    machine.values = values;
    machine.skipped = skipped.into();
    Ok(())
  }

  /// Re-evaluate every skip predicate against the current data bag.
  async fn refresh_skips(&self) -> Result<Arc<[bool]>, WizardError> {
    let values = Arc::clone(&self.machine().values);
    let skipped: Arc<[bool]> = resolve_skips(&self.steps, &values).await?.into();
    self.machine().skipped = Arc::clone(&skipped);
    Ok(skipped)
  }

  pub(crate) async fn check_guard(&self, guard: Option<&Guard<D>>) -> HookResult<bool> {
    match guard {
      None => Ok(true),
      Some(guard) => {
        let ctx = self.context();
        invoke(|| guard(ctx)).await
      }
    }
  }

  /// Run a hook against a fresh context. `Some` is a replacement data bag
  /// for the caller to commit.
  pub(crate) async fn run_hook(&self, hook: Option<&Hook<D>>) -> HookResult<Option<D>> {
    let Some(hook) = hook else {
      return Ok(None);
    };
    let ctx = self.context();
    invoke(|| hook(ctx)).await
  }

  async fn navigate(&self, operation: &str, direction: Direction) -> NavOutcome {
    if !self.try_begin(operation) {
      return NavOutcome::Dropped;
    }

    match self.transition(direction).await {
      Ok(outcome) => {
        self.finish();
        outcome
      }
      Err(e) => {
        self.fail(e);
        NavOutcome::Failed
      }
    }
  }

  async fn transition(&self, direction: Direction) -> Result<NavOutcome, WizardError> {
    let from = self.active_index();
    let steps = Arc::clone(&self.steps);
    let from_step = &steps[from];

    if matches!(direction, Direction::To(target) if target == from) {
      debug!(instance_id = %self.instance_id, step_id = %from_step.id, "already on step");
      return Ok(NavOutcome::NoMovement);
    }

    if direction.checks_leave() {
      let allowed = self
        .check_guard(from_step.can_leave.as_ref())
        .await
        .map_err(|source| step_error(from_step, HookPhase::CanLeave, source))?;
      self.emit(&from_step.id, LifecyclePhase::CanLeave, None);
      if !allowed {
        debug!(instance_id = %self.instance_id, step_id = %from_step.id, "can_leave rejected");
        self.emit(
          &from_step.id,
          LifecyclePhase::GuardRejected,
          Some(HookPhase::CanLeave.to_string()),
        );
        return Ok(NavOutcome::Blocked);
      }
    }

    let left = self
      .run_hook(from_step.on_leave.as_ref())
      .await
      .map_err(|source| step_error(from_step, HookPhase::OnLeave, source))?;
    if let Some(values) = left {
      self.commit_values(values).await?;
    }
    self.emit(&from_step.id, LifecyclePhase::Leave, None);

    // Resolve against the data bag as it is after on_leave.
    let skipped = self.refresh_skips().await?;
    let (target, passed_over) = {
      let navigator = Navigator::new(&steps, &skipped);
      match direction {
        Direction::Forward => {
          let target = navigator.resolve_next(from);
          (target, (from + 1..target).collect::<Vec<_>>())
        }
        Direction::Backward => {
          let target = navigator.resolve_previous(from);
          (target, (target + 1..from).rev().collect::<Vec<_>>())
        }
        Direction::To(target) if navigator.is_skipped(target) => (from, Vec::new()),
        Direction::To(target) => (target, Vec::new()),
      }
    };

    if target == from {
      debug!(instance_id = %self.instance_id, step_id = %from_step.id, "no movement");
      return Ok(NavOutcome::NoMovement);
    }

    for index in passed_over {
      self.emit(&steps[index].id, LifecyclePhase::Skipped, None);
    }

    let to_step = &steps[target];
    let allowed = self
      .check_guard(to_step.can_enter.as_ref())
      .await
      .map_err(|source| step_error(to_step, HookPhase::CanEnter, source))?;
    self.emit(&to_step.id, LifecyclePhase::CanEnter, None);
    if !allowed {
      debug!(instance_id = %self.instance_id, step_id = %to_step.id, "can_enter rejected");
      self.emit(
        &to_step.id,
        LifecyclePhase::GuardRejected,
        Some(HookPhase::CanEnter.to_string()),
      );
      return Ok(NavOutcome::Blocked);
    }

    self.machine().active_index = target;
    info!(
      instance_id = %self.instance_id,
      from = %from_step.id,
      to = %to_step.id,
      "step_changed"
    );

    let entered = self
      .run_hook(to_step.on_enter.as_ref())
      .await
      .map_err(|source| step_error(to_step, HookPhase::OnEnter, source))?;
    if let Some(values) = entered {
      self.commit_values(values).await?;
    }
    self.emit(&to_step.id, LifecyclePhase::Enter, None);

    Ok(NavOutcome::Moved)
  }
}

fn step_error<D>(step: &Step<D>, phase: HookPhase, source: HookError) -> WizardError {
  WizardError::Step {
    step_id: step.id.clone(),
    phase,
    source,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_rejects_empty_step_list() {
    let config = WizardConfig::<u8>::new(Vec::new(), 0);
    assert_eq!(Wizard::new(config).await.unwrap_err(), ConfigError::NoSteps);
  }

  #[tokio::test]
  async fn test_rejects_duplicate_step_ids() {
    let config = WizardConfig::new(
      vec![Step::new("a", "A"), Step::new("b", "B"), Step::new("a", "Again")],
      0u8,
    );
    assert_eq!(
      Wizard::new(config).await.unwrap_err(),
      ConfigError::DuplicateStepId {
        step_id: "a".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_initial_step_is_first_visible() {
    let config = WizardConfig::new(
      vec![
        Step::new("intro", "Intro").skip_when(|returning: &bool| *returning),
        Step::new("details", "Details"),
      ],
      true,
    );
    let wizard = Wizard::new(config).await.unwrap();
    assert_eq!(wizard.context().active_step_id(), "details");
    assert_eq!(wizard.state(), EngineState::Idle);
  }

  #[tokio::test]
  async fn test_initial_step_when_everything_is_skipped() {
    let config = WizardConfig::new(
      vec![Step::new("a", "A").skip_when(|_: &bool| true)],
      false,
    );
    let wizard = Wizard::new(config).await.unwrap();
    assert_eq!(wizard.context().active_step_index(), 0);
    assert_eq!(wizard.context().progress_percent(), 0);
  }

  #[tokio::test]
  async fn test_failing_initial_skip_rejects_config() {
    let config = WizardConfig::new(
      vec![
        Step::new("a", "A"),
        Step::new("b", "B").skip_when_async(|_: Arc<u8>| async { Err(HookError::new("offline")) }),
      ],
      0u8,
    );

    let err = Wizard::new(config).await.unwrap_err();
    let ConfigError::InitialSkip(cause) = err else {
      panic!("expected an initial skip error, got {err:?}");
    };
    assert_eq!(cause.step_id(), "b");
    assert_eq!(cause.phase(), HookPhase::ShouldSkip);
  }

  #[tokio::test]
  async fn test_update_values_keeps_active_step() {
    let config = WizardConfig::new(
      vec![
        Step::new("a", "A"),
        Step::new("b", "B").skip_when(|n: &u8| *n > 1),
      ],
      0u8,
    );
    let wizard = Wizard::new(config).await.unwrap();

    assert_eq!(wizard.update_values(|n| *n = 5).await, NavOutcome::Applied);
    assert_eq!(*wizard.values(), 5);
    assert_eq!(wizard.context().active_step_id(), "a");
    assert_eq!(wizard.context().visible_steps(), ["a"]);
  }

  #[tokio::test]
  async fn test_rejected_values_are_not_stored() {
    let config = WizardConfig::new(
      vec![
        Step::new("a", "A"),
        Step::new("b", "B").skip_when(|n: &u8| {
          assert!(*n < 10, "out of range");
          false
        }),
      ],
      0u8,
    );
    let wizard = Wizard::new(config).await.unwrap();

    assert_eq!(wizard.set_values(42).await, NavOutcome::Failed);
    assert_eq!(*wizard.values(), 0);
    assert_eq!(wizard.state(), EngineState::Error);
    assert_eq!(wizard.error().unwrap().phase(), HookPhase::ShouldSkip);
  }

  #[tokio::test]
  async fn test_reset_requires_manual_recovery() {
    let wizard = Wizard::new(WizardConfig::new(vec![Step::new("a", "A")], 0u8))
      .await
      .unwrap();
    assert!(!wizard.reset());
  }
}
