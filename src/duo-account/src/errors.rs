//! Account errors and their revert-data encoding.
//!
//! Every variant except [`AccountError::ExternalCallFailed`] has a Solidity custom error so it can
//! cross a call boundary as revert data. Revert data coming back from a call is only turned back
//! into an account error when the account itself raised it (see `engine.rs`); anything else is
//! carried verbatim.

use alloy_primitives::Bytes;
use alloy_sol_types::{sol, SolError};

sol! {
    error BadOwner();
    error NotOwner();
    error NotApprover();
    error AlreadyApproved();
    error WrongLen();
    error Expired();
    error BadSign();
    error Signed();
    error Reentrancy();
    error InsufficientBudget();
}

/// Errors raised by account entry points. Any error aborts the whole top-level call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("invalid, duplicate or colliding owner")]
    BadOwner,
    #[error("caller lacks the role required by this entry point")]
    NotOwner,
    #[error("caller is not the pending proposer")]
    NotApprover,
    #[error("caller already proposed this action")]
    AlreadyApproved,
    #[error("batch arrays differ in length")]
    WrongLen,
    #[error("signature deadline has passed")]
    Expired,
    #[error("malformed, malleable or unrecoverable signature")]
    BadSign,
    #[error("signature already consumed")]
    Signed,
    #[error("reentrant call")]
    Reentrancy,
    #[error("allowance or permit budget exhausted")]
    InsufficientBudget,
    #[error("external call failed (revert data {0})")]
    ExternalCallFailed(Bytes),
}

impl AccountError {
    /// Revert data for this error as seen by a caller on the other side of a call boundary.
    pub fn revert_data(&self) -> Bytes {
        let encoded = match self {
            AccountError::BadOwner => BadOwner {}.abi_encode(),
            AccountError::NotOwner => NotOwner {}.abi_encode(),
            AccountError::NotApprover => NotApprover {}.abi_encode(),
            AccountError::AlreadyApproved => AlreadyApproved {}.abi_encode(),
            AccountError::WrongLen => WrongLen {}.abi_encode(),
            AccountError::Expired => Expired {}.abi_encode(),
            AccountError::BadSign => BadSign {}.abi_encode(),
            AccountError::Signed => Signed {}.abi_encode(),
            AccountError::Reentrancy => Reentrancy {}.abi_encode(),
            AccountError::InsufficientBudget => InsufficientBudget {}.abi_encode(),
            AccountError::ExternalCallFailed(data) => return data.clone(),
        };
        Bytes::from(encoded)
    }
}

/// Errors while loading an [`AccountConfig`](crate::config::AccountConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed parsing config: {0}")]
    Json(#[from] serde_json::Error),
}
