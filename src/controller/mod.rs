//! # Controller
//!
//! Core controller modules for the Fivetran operator.
//!
//! - `reconciler`: Reconciliation engine for `FivetranConnector` resources
//! - `server`: HTTP server for metrics and health checks

pub mod reconciler;
pub mod server;
