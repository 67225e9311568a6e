//! Waypoint Wizard Engine
//!
//! Drives multi-step flows through asynchronous, guarded, skippable steps
//! with dynamically computed actions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Wizard                             │
//! │  - go_next / go_back / goto / run_action / complete         │
//! │  - owns active index, data bag, skip flags, engine state    │
//! │  - drops calls that arrive while transitioning              │
//! └─────────────────────────────────────────────────────────────┘
//!                │                               │
//!                ▼                               ▼
//! ┌──────────────────────────────┐ ┌────────────────────────────┐
//! │          Navigator           │ │       ActionPipeline       │
//! │  - resolve_skips             │ │  - guards, in order        │
//! │  - resolve_next / previous   │ │                            │
//! │  - visible steps, progress   │ │  - effects, in order       │
//! └──────────────────────────────┘ │  - navigation directive    │
//!                                  └────────────────────────────┘
//! ```
//!
//! Hooks receive a [`WizardContext`] snapshot built right before they run.
//! A hook that wants to change the data bag returns the replacement; the
//! engine commits it before the next hook sees a context.
//!
//! Skip predicates may be synchronous (`skip_when`) or asynchronous
//! (`skip_when_async`). They are resolved on every navigation call and every
//! data bag change, before the new data bag is committed.
//!
//! # Usage
//!
//! ```ignore
//! use waypoint_engine::{Step, Wizard, WizardConfig, actions};
//!
//! let steps = vec![
//!   Step::new("basics", "Basics").with_actions(vec![actions::next()]),
//!   Step::new("location", "Location").skip_when(|form: &Form| form.remote),
//!   Step::new("review", "Review").with_actions(vec![actions::back(), actions::submit()]),
//! ];
//!
//! let wizard = Wizard::new(WizardConfig::new(steps, Form::default())).await?;
//! wizard.run_action("next").await;
//! println!("{}%", wizard.context().progress_percent());
//! ```

mod action;
pub mod actions;
mod config;
mod context;
mod engine;
mod error;
mod events;
mod hook;
mod navigation;
mod pipeline;
mod step;
mod ui;

pub use action::{Action, ActionVariant, CustomNavigation, Navigation};
pub use config::{EngineOptions, ErrorRecovery, WizardConfig};
pub use context::{ContextSnapshot, EngineState, WizardContext};
pub use engine::{NavOutcome, Wizard};
pub use error::{ConfigError, HookError, HookPhase, WizardError};
pub use events::{
  ChannelNotifier, EventLog, LifecyclePhase, NoopNotifier, WizardEvent, WizardNotifier,
};
pub use hook::{
  CompletionHook, Guard, Hook, HookFuture, HookResult, SkipPredicate, WizardData,
};
pub use navigation::{Navigator, resolve_skips};
pub use step::{ActionsProvider, Step};
pub use ui::{StepStatus, StepUiConfig, apply_engine_state, map_to_ui};
