//! Lifecycle events and notifiers.
//!
//! The engine emits one [`WizardEvent`] per lifecycle phase it passes through,
//! in order, so consumers can assert or display the sequence without parsing
//! log output.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Which point of the lifecycle an event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
  /// `can_leave` was evaluated on the step being left.
  CanLeave,
  /// `on_leave` ran on the step being left.
  Leave,
  /// `can_enter` was evaluated on the target step.
  CanEnter,
  /// The step became active.
  Enter,
  /// The step was passed over during skip resolution.
  Skipped,
  /// A guard resolved false.
  GuardRejected,
  ActionStarted,
  ActionAborted,
  EffectApplied,
  ActionCompleted,
  /// The completion callback finished.
  Completed,
  /// A hard failure moved the engine into the error state.
  Failed,
  /// A call arrived while another was in flight and was dropped.
  Dropped,
}

/// One entry of the lifecycle stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardEvent {
  /// Position in the stream of this wizard instance, starting at 0.
  pub seq: u64,
  pub instance_id: String,
  pub step_id: String,
  pub phase: LifecyclePhase,
  /// Action key, target step or error message, depending on the phase.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub detail: Option<String>,
  pub timestamp: DateTime<Utc>,
}

/// Receives lifecycle events.
///
/// The engine calls `notify` synchronously for each event. Implementations
/// must not block.
pub trait WizardNotifier: Send + Sync {
  fn notify(&self, event: WizardEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl WizardNotifier for NoopNotifier {
  fn notify(&self, _event: WizardEvent) {}
}

/// Sends events to an unbounded channel for asynchronous consumers.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<WizardEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<WizardEvent>) -> Self {
    Self { sender }
  }
}

impl WizardNotifier for ChannelNotifier {
  fn notify(&self, event: WizardEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}

/// Keeps every event in memory, in emission order.
///
/// Clones share the same buffer, so a test can hand one clone to the wizard
/// and read from another.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
  events: Arc<Mutex<Vec<WizardEvent>>>,
}

impl EventLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<WizardEvent> {
    self
      .events
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn phases(&self) -> Vec<LifecyclePhase> {
    self
      .events
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .iter()
      .map(|event| event.phase)
      .collect()
  }

  /// `(step_id, phase)` pairs, the shape most ordering assertions want.
  pub fn trace(&self) -> Vec<(String, LifecyclePhase)> {
    self
      .events
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .iter()
      .map(|event| (event.step_id.clone(), event.phase))
      .collect()
  }

  pub fn clear(&self) {
    self
      .events
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clear();
  }
}

impl WizardNotifier for EventLog {
  fn notify(&self, event: WizardEvent) {
    self
      .events
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(event);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn event(seq: u64, step_id: &str, phase: LifecyclePhase) -> WizardEvent {
    WizardEvent {
      seq,
      instance_id: "test".to_string(),
      step_id: step_id.to_string(),
      phase,
      detail: None,
      timestamp: Utc::now(),
    }
  }

  #[test]
  fn test_event_log_shares_buffer_between_clones() {
    let log = EventLog::new();
    let writer = log.clone();

    writer.notify(event(0, "a", LifecyclePhase::CanLeave));
    writer.notify(event(1, "a", LifecyclePhase::Leave));

    assert_eq!(
      log.phases(),
      vec![LifecyclePhase::CanLeave, LifecyclePhase::Leave]
    );
    assert_eq!(log.trace()[1], ("a".to_string(), LifecyclePhase::Leave));

    log.clear();
    assert!(writer.events().is_empty());
  }

  #[tokio::test]
  async fn test_channel_notifier_forwards_events() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let notifier = ChannelNotifier::new(tx);

    notifier.notify(event(0, "b", LifecyclePhase::Enter));

    let received = rx.recv().await.unwrap();
    assert_eq!(received.step_id, "b");
    assert_eq!(received.phase, LifecyclePhase::Enter);
  }

  #[test]
  fn test_channel_notifier_ignores_closed_receiver() {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);
    ChannelNotifier::new(tx).notify(event(0, "a", LifecyclePhase::Enter));
  }

  #[test]
  fn test_phase_serde_names() {
    let json = serde_json::to_string(&LifecyclePhase::GuardRejected).unwrap();
    assert_eq!(json, "\"guard_rejected\"");
  }
}
