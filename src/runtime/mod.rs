//! # Runtime
//!
//! Controller runtime: start-up, the Kubernetes watch loop, event gating and
//! the error policy for failures the reconciler hands back.

pub mod error_policy;
pub mod initialization;
pub mod trigger;
pub mod watch_loop;

pub use initialization::{initialize, InitializationResult};
pub use trigger::TriggerGate;
pub use watch_loop::run_watch_loop;
