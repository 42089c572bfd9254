//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use fivetran_operator::prelude::*;
//! ```

// CRD types - most commonly used
pub use crate::crd::*;

// Collaborator traits - implemented by the real clients and by test fakes
pub use crate::controller::reconciler::ResourceStore;
pub use crate::fivetran::FivetranApi;
pub use crate::vault::{SecretStore, SecretStoreProvider};

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    reconcile, Disposition, ReconcileOutcome, Reconciler, ReconcilerError, StoreError,
    TriggerSource,
};

pub use crate::config::ControllerConfig;

// Common error types
pub use crate::fivetran::ApiError;
pub use crate::vault::{SecretStoreError, VaultError, VaultErrorKind};
