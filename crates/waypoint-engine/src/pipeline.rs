//! Action pipeline: guards, then effects, then hand back the navigation.

use tracing::debug;

use crate::action::{Action, Navigation};
use crate::engine::Shared;
use crate::error::{HookError, HookPhase, WizardError};
use crate::events::LifecyclePhase;
use crate::hook::WizardData;

pub(crate) enum PipelineOutcome<D> {
  /// A guard resolved false. Nothing else ran.
  Aborted,
  /// Guards passed and every effect ran.
  Proceed(Option<Navigation<D>>),
}

/// Executes one action against the engine's shared holder.
///
/// The caller owns the transitioning state; the pipeline only runs callbacks
/// and commits data bag replacements.
pub(crate) struct ActionPipeline<'a, D> {
  shared: &'a Shared<D>,
  step_id: &'a str,
  action: Action<D>,
}

impl<'a, D: WizardData> ActionPipeline<'a, D> {
  pub(crate) fn new(shared: &'a Shared<D>, step_id: &'a str, action: Action<D>) -> Self {
    Self {
      shared,
      step_id,
      action,
    }
  }

  pub(crate) async fn execute(self) -> Result<PipelineOutcome<D>, WizardError> {
    let ActionPipeline {
      shared,
      step_id,
      action,
    } = self;
    let Action {
      key,
      guards,
      effects,
      navigation,
      ..
    } = action;

    shared.emit(step_id, LifecyclePhase::ActionStarted, Some(key.clone()));

    for (index, guard) in guards.iter().enumerate() {
      let allowed = shared
        .check_guard(Some(guard))
        .await
        .map_err(|source| action_error(step_id, &key, HookPhase::Guard, source))?;

      if !allowed {
        debug!(step_id = %step_id, action = %key, guard = index, "action guard rejected");
        shared.emit(
          step_id,
          LifecyclePhase::GuardRejected,
          Some(format!("{key}:guard[{index}]")),
        );
        shared.emit(step_id, LifecyclePhase::ActionAborted, Some(key));
        return Ok(PipelineOutcome::Aborted);
      }
    }

    for effect in &effects {
      let replaced = shared
        .run_hook(Some(effect))
        .await
        .map_err(|source| action_error(step_id, &key, HookPhase::Effect, source))?;
      if let Some(values) = replaced {
        shared.commit_values(values).await?;
      }
      shared.emit(step_id, LifecyclePhase::EffectApplied, Some(key.clone()));
    }

    Ok(PipelineOutcome::Proceed(navigation))
  }
}

fn action_error(step_id: &str, key: &str, phase: HookPhase, source: HookError) -> WizardError {
  WizardError::Action {
    step_id: step_id.to_string(),
    action: key.to_string(),
    phase,
    source,
  }
}
