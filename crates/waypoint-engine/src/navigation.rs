//! Navigation resolution.
//!
//! Skip predicates may be asynchronous, so resolution happens in two parts:
//! [`resolve_skips`] evaluates every predicate against one data bag, and
//! [`Navigator`] answers movement, visibility and progress queries over the
//! resulting flags. The engine re-runs [`resolve_skips`] on every navigation
//! call and after every data change; nothing is cached between data bags.

use std::sync::Arc;

use crate::error::{HookPhase, WizardError};
use crate::hook::WizardData;
use crate::step::Step;

/// Evaluate every step's skip predicate against `values`, in step order.
///
/// The first failing or panicking predicate aborts resolution.
pub async fn resolve_skips<D: WizardData>(
  steps: &[Step<D>],
  values: &Arc<D>,
) -> Result<Vec<bool>, WizardError> {
  let mut skipped = Vec::with_capacity(steps.len());
  for step in steps {
    let flag = step
      .resolve_skip(values)
      .await
      .map_err(|source| WizardError::Step {
        step_id: step.id.clone(),
        phase: HookPhase::ShouldSkip,
        source,
      })?;
    skipped.push(flag);
  }
  Ok(skipped)
}

/// Resolves movement and visibility for a step list against resolved skip
/// flags.
#[derive(Debug)]
pub struct Navigator<'a, D> {
  steps: &'a [Step<D>],
  skipped: &'a [bool],
}

impl<'a, D: WizardData> Navigator<'a, D> {
  pub fn new(steps: &'a [Step<D>], skipped: &'a [bool]) -> Self {
    Self { steps, skipped }
  }

  /// Whether the step at `index` is skipped. Out-of-range indices count as
  /// skipped.
  pub fn is_skipped(&self, index: usize) -> bool {
    self.skipped.get(index).copied().unwrap_or(true)
  }

  /// Index of the next visible step after `from`, or `from` when there is
  /// none.
  pub fn resolve_next(&self, from: usize) -> usize {
    (from + 1..self.steps.len())
      .find(|&index| !self.is_skipped(index))
      .unwrap_or(from)
  }

  /// Index of the previous visible step before `from`, or `from` when there
  /// is none.
  pub fn resolve_previous(&self, from: usize) -> usize {
    (0..from.min(self.steps.len()))
      .rev()
      .find(|&index| !self.is_skipped(index))
      .unwrap_or(from)
  }

  /// Index of the first visible step, if any.
  pub fn first_visible(&self) -> Option<usize> {
    (0..self.steps.len()).find(|&index| !self.is_skipped(index))
  }

  /// Visible steps in their original order.
  pub fn visible_steps(&self) -> Vec<&'a Step<D>> {
    self
      .steps
      .iter()
      .enumerate()
      .filter(|&(index, _)| !self.is_skipped(index))
      .map(|(_, step)| step)
      .collect()
  }

  pub fn visible_step_ids(&self) -> Vec<String> {
    self
      .visible_steps()
      .into_iter()
      .map(|step| step.id.clone())
      .collect()
  }

  /// Position of the active step among visible steps, as a rounded
  /// percentage. Zero when no step is visible.
  pub fn progress(&self, active_index: usize) -> u8 {
    let visible: Vec<usize> = (0..self.steps.len())
      .filter(|&index| !self.is_skipped(index))
      .collect();

    if visible.is_empty() {
      return 0;
    }

    // A skipped active step sits at position -1.
    let position = visible
      .iter()
      .position(|&index| index == active_index)
      .map_or(-1.0, |p| p as f64);

    let percent = ((position + 1.0) / visible.len() as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
  }
}
