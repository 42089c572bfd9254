//! # Status
//!
//! Condition bookkeeping and status writes.

pub mod conditions;
pub mod persist;

pub use conditions::{ConditionSet, STATUS_FALSE, STATUS_TRUE, STATUS_UNKNOWN};
pub use persist::{
    connector_url, has_failed_conditions, save, set_condition, set_connector_id,
};
