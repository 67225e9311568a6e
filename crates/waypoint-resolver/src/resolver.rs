use std::collections::HashSet;

use futures::future::{self, Ready};
use serde_json::Value;
use tracing::{info, warn};

use waypoint_config::{
  ActionDef, ActionVariant as ActionVariantDef, Condition, EffectDef, ErrorRecovery as RecoveryDef,
  NavigationDef, PathError, StepDef, WizardDef,
};
use waypoint_engine::{
  Action, ActionVariant, EngineOptions, ErrorRecovery, HookError, HookResult, Navigation, Step,
  Wizard, WizardConfig, WizardContext, WizardNotifier,
};

use crate::error::ResolveError;

/// Resolver transforms a WizardDef into a runnable engine configuration.
pub trait Resolver: Send + Sync {
  /// Resolve a wizard definition.
  ///
  /// This process:
  /// 1. Validates the definition (unique ids and keys, goto targets, pointers)
  /// 2. Turns conditions and effects into engine callbacks over the data bag
  /// 3. Carries over the initial values and engine options
  fn resolve(&self, def: WizardDef) -> Result<ResolvedWizard, ResolveError>;
}

/// A resolved definition, ready to be built into a [`Wizard`].
#[derive(Debug)]
pub struct ResolvedWizard {
  pub wizard_id: String,
  pub name: String,
  pub description: Option<String>,
  pub config: WizardConfig<Value>,
}

impl ResolvedWizard {
  pub async fn build(self) -> Result<Wizard<Value>, ResolveError> {
    Ok(Wizard::new(self.config).await?)
  }

  pub async fn build_with_notifier(
    self,
    notifier: impl WizardNotifier + 'static,
  ) -> Result<Wizard<Value>, ResolveError> {
    Ok(Wizard::with_notifier(self.config, notifier).await?)
  }
}

/// Standard resolver for JSON data bags.
#[derive(Debug, Clone, Default)]
pub struct StandardResolver;

impl StandardResolver {
  pub fn new() -> Self {
    Self
  }

  /// Check the definition without building anything.
  pub fn validate(&self, def: &WizardDef) -> Result<(), ResolveError> {
    if def.steps.is_empty() {
      return Err(ResolveError::NoSteps {
        wizard_id: def.wizard_id.clone(),
      });
    }

    let mut step_ids = HashSet::new();
    for step in &def.steps {
      if !step_ids.insert(step.step_id.as_str()) {
        return Err(ResolveError::DuplicateStepId {
          step_id: step.step_id.clone(),
        });
      }
    }

    for step in &def.steps {
      self.validate_actions(step, &step_ids)?;

      let invalid_path = |source: PathError| ResolveError::InvalidPath {
        step_id: step.step_id.clone(),
        source,
      };
      for condition in step.conditions() {
        condition.validate().map_err(invalid_path)?;
      }
      for effect in step.effects() {
        effect.validate().map_err(invalid_path)?;
      }
    }

    Ok(())
  }

  fn validate_actions(&self, step: &StepDef, step_ids: &HashSet<&str>) -> Result<(), ResolveError> {
    let mut keys = HashSet::new();
    for action in &step.actions {
      if !keys.insert(action.key.as_str()) {
        return Err(ResolveError::DuplicateActionKey {
          step_id: step.step_id.clone(),
          key: action.key.clone(),
        });
      }

      if let Some(NavigationDef::Goto { step_id: target }) = &action.navigation {
        if !step_ids.contains(target.as_str()) {
          return Err(ResolveError::UnknownGotoTarget {
            step_id: step.step_id.clone(),
            action: action.key.clone(),
            target: target.clone(),
          });
        }
      }
    }
    Ok(())
  }
}

impl Resolver for StandardResolver {
  fn resolve(&self, def: WizardDef) -> Result<ResolvedWizard, ResolveError> {
    self.validate(&def)?;

    let WizardDef {
      wizard_id,
      name,
      description,
      error_recovery,
      initial_values,
      steps,
    } = def;

    let steps: Vec<Step<Value>> = steps.into_iter().map(resolve_step).collect();
    info!(wizard_id = %wizard_id, steps = steps.len(), "wizard_resolved");

    let options = EngineOptions {
      error_recovery: match error_recovery {
        RecoveryDef::Terminal => ErrorRecovery::Terminal,
        RecoveryDef::Manual => ErrorRecovery::Manual,
      },
    };

    Ok(ResolvedWizard {
      wizard_id,
      name,
      description,
      config: WizardConfig::new(steps, initial_values).options(options),
    })
  }
}

fn resolve_step(def: StepDef) -> Step<Value> {
  let StepDef {
    step_id,
    title,
    description,
    icon,
    skip_when,
    can_enter,
    can_leave,
    on_enter,
    on_leave,
    actions,
  } = def;

  let mut step = Step::new(step_id.clone(), title);
  if let Some(description) = description {
    step = step.description(description);
  }
  if let Some(icon) = icon {
    step = step.icon(icon);
  }
  if let Some(condition) = skip_when {
    step = step.skip_when(move |values: &Value| match condition.evaluate(values) {
      Ok(skip) => skip,
      Err(e) => {
        warn!(step_id = %step_id, error = %e, "skip condition failed, step stays visible");
        false
      }
    });
  }
  if let Some(condition) = can_enter {
    step = step.can_enter(condition_guard(condition));
  }
  if let Some(condition) = can_leave {
    step = step.can_leave(condition_guard(condition));
  }
  if !on_enter.is_empty() {
    step = step.on_enter(effects_hook(on_enter));
  }
  if !on_leave.is_empty() {
    step = step.on_leave(effects_hook(on_leave));
  }
  if !actions.is_empty() {
    step = step.with_actions(actions.into_iter().map(resolve_action).collect());
  }
  step
}

fn resolve_action(def: ActionDef) -> Action<Value> {
  let ActionDef {
    key,
    label,
    icon,
    variant,
    guards,
    effects,
    navigation,
  } = def;

  let variant = match variant {
    ActionVariantDef::Primary => ActionVariant::Primary,
    ActionVariantDef::Secondary => ActionVariant::Secondary,
    ActionVariantDef::Danger => ActionVariant::Danger,
    ActionVariantDef::Link => ActionVariant::Link,
  };

  let mut action = Action::new(key, label).variant(variant);
  if let Some(icon) = icon {
    action = action.icon(icon);
  }
  for condition in guards {
    action = action.guard(condition_guard(condition));
  }
  for effect in effects {
    action = action.effect(effects_hook(vec![effect]));
  }
  if let Some(navigation) = navigation {
    action = action.navigate(match navigation {
      NavigationDef::Advance => Navigation::Advance,
      NavigationDef::Retreat => Navigation::Retreat,
      NavigationDef::Goto { step_id } => Navigation::GotoStep(step_id),
      NavigationDef::Complete => Navigation::complete(),
    });
  }
  action
}

fn condition_guard(
  condition: Condition,
) -> impl Fn(WizardContext<Value>) -> Ready<HookResult<bool>> + Send + Sync + 'static {
  move |ctx| future::ready(condition.evaluate(ctx.values()).map_err(hook_error))
}

fn effects_hook(
  effects: Vec<EffectDef>,
) -> impl Fn(WizardContext<Value>) -> Ready<HookResult<Option<Value>>> + Send + Sync + 'static {
  move |ctx| {
    let mut values = ctx.values().clone();
    let result = effects
      .iter()
      .try_for_each(|effect| effect.apply(&mut values))
      .map(|()| Some(values))
      .map_err(hook_error);
    future::ready(result)
  }
}

fn hook_error(error: PathError) -> HookError {
  HookError::new(error.to_string())
}
