//! Ready-made actions.
//!
//! Each returns a plain [`Action`] that callers extend with their own guards,
//! effects and icons through the builder methods.

use std::future::Future;

use crate::action::{Action, ActionVariant, Navigation};
use crate::context::WizardContext;
use crate::hook::{HookResult, WizardData};

/// Advance to the next visible step.
pub fn next<D: WizardData>() -> Action<D> {
  Action::new("next", "Next").navigate(Navigation::Advance)
}

/// Return to the previous visible step.
pub fn back<D: WizardData>() -> Action<D> {
  Action::new("back", "Back")
    .variant(ActionVariant::Secondary)
    .navigate(Navigation::Retreat)
}

/// Run `handler` and stay on the current step.
pub fn cancel<D, F, Fut>(handler: F) -> Action<D>
where
  D: WizardData,
  F: Fn(WizardContext<D>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = HookResult<Option<D>>> + Send + 'static,
{
  Action::new("cancel", "Cancel")
    .variant(ActionVariant::Link)
    .effect(handler)
}

/// Persist a draft through `handler` and stay on the current step.
pub fn save_draft<D, F, Fut>(handler: F) -> Action<D>
where
  D: WizardData,
  F: Fn(WizardContext<D>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = HookResult<Option<D>>> + Send + 'static,
{
  Action::new("save_draft", "Save draft")
    .variant(ActionVariant::Secondary)
    .effect(handler)
}

/// Finish the wizard by running its completion callback.
pub fn submit<D: WizardData>() -> Action<D> {
  Action::new("submit", "Submit").navigate(Navigation::complete())
}
