//! Waypoint Config
//!
//! Serializable wizard definitions. These describe a wizard before it is
//! resolved into a runnable engine configuration:
//!
//! - steps with declarative skip predicates, guards and lifecycle effects
//! - actions with guards, effects and a navigation directive
//! - conditions and effects addressed by JSON pointers into the data bag
//!
//! Definitions are plain JSON documents, loaded by the CLI from a file or a
//! data directory.

mod action;
mod condition;
mod effect;
mod error;
pub mod pointer;
mod step;
mod wizard;

pub use action::{ActionDef, ActionVariant, NavigationDef};
pub use condition::Condition;
pub use effect::EffectDef;
pub use error::PathError;
pub use step::StepDef;
pub use wizard::{ErrorRecovery, WizardDef};
