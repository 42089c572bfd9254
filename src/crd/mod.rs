//! # Custom Resource Definitions
//!
//! CRD types for the Fivetran operator.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `FivetranConnector` resource and connector settings
//! - `schema.rs` - Declared schema/table/column configuration
//! - `status.rs` - Status types for tracking reconciliation state

mod schema;
mod spec;
mod status;

pub use schema::{ColumnSpec, SchemaChangeHandling, SchemaNode, SchemaSpec, SyncMode, TableNode};
pub use spec::{
    ConnectorSpec, DataDelaySensitivity, FivetranConnector, FivetranConnectorSpec, ScheduleType,
};
pub use status::{Condition, FivetranConnectorStatus};
