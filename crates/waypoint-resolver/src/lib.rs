//! Waypoint Resolver
//!
//! Turns a declarative [`WizardDef`](waypoint_config::WizardDef) into a
//! runnable engine configuration over a JSON data bag. Resolution validates
//! the definition up front, so evaluation errors at run time are limited to
//! data that does not have the expected shape.

mod error;
mod resolver;

pub use error::ResolveError;
pub use resolver::{ResolvedWizard, Resolver, StandardResolver};
