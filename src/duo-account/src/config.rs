//! Deployment configuration for an account.

use std::{fs, path::Path};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Who controls an account and where it lives.
///
/// ```json
/// {
///   "address": "0x00000000000000000000000000000000000000aa",
///   "owners": ["0x...01", "0x...02"],
///   "assistant": "0x...03",
///   "origin": "0x...f0"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    /// Address of the account itself (the EIP-712 verifying contract).
    pub address: Address,
    /// The two primary principals, in any order.
    pub owners: [Address; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant: Option<Address>,
    /// Deploying factory; may set allowances and permits for any spender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Address>,
}

impl AccountConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}
