//! Fivetran Operator Library
//!
//! Reconciles `FivetranConnector` resources against the Fivetran REST API,
//! resolving `vault:` references in connector settings from HashiCorp Vault.
//!
//! ## Quick Start
//!
//! ```rust
//! use fivetran_operator::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod fivetran;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod vault;
