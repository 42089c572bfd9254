//! # Vault Settings
//!
//! Connection settings for Vault, read from a Kubernetes Secret with the keys
//! `address`, `roleId`, `secretId` and `mountPath`.

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Secret;
use zeroize::Zeroizing;

/// KV v2 mount used when the Secret does not name one
pub const DEFAULT_MOUNT_PATH: &str = "secret";

pub struct VaultSettings {
    pub address: String,
    pub role_id: String,
    pub secret_id: Zeroizing<String>,
    pub mount_path: String,
}

impl std::fmt::Debug for VaultSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSettings")
            .field("address", &self.address)
            .field("role_id", &self.role_id)
            .field("secret_id", &"***")
            .field("mount_path", &self.mount_path)
            .finish()
    }
}

impl VaultSettings {
    /// Extract settings from the Secret's `data`
    ///
    /// # Errors
    /// Returns an error when `address`, `roleId` or `secretId` is missing,
    /// empty or not UTF-8
    pub fn from_secret(secret: &Secret) -> Result<Self> {
        let name = secret.metadata.name.as_deref().unwrap_or("unknown");
        let data = secret
            .data
            .as_ref()
            .with_context(|| format!("Vault secret '{name}' has no data"))?;

        let read = |key: &str| -> Result<Option<String>> {
            data.get(key)
                .map(|bytes| {
                    String::from_utf8(bytes.0.clone())
                        .with_context(|| format!("Vault secret '{name}' key '{key}' is not UTF-8"))
                })
                .transpose()
                .map(|value| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
        };
        let required = |key: &str| -> Result<String> {
            read(key)?.with_context(|| format!("Vault secret '{name}' is missing key '{key}'"))
        };

        Ok(Self {
            address: required("address")?.trim_end_matches('/').to_string(),
            role_id: required("roleId")?,
            secret_id: Zeroizing::new(required("secretId")?),
            mount_path: read("mountPath")?
                .map(|mount| mount.trim_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_MOUNT_PATH.to_string()),
        })
    }
}
