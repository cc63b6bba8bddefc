//! Account event log entries.

use alloy_primitives::{Address, B256, U256};
use serde::Serialize;

/// Ownership slot identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    Owner0,
    Owner1,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum AccountEvent {
    OwnershipChanged {
        slot: Slot,
        previous: Address,
        current: Address,
    },
    Proposed {
        fingerprint: B256,
        proposer: Address,
    },
    Executed {
        fingerprint: B256,
        proposer: Address,
        confirmer: Address,
    },
    Cancelled {
        fingerprint: B256,
        proposer: Address,
    },
    AllowanceSet {
        token: Address,
        spender: Address,
        amount: U256,
    },
    AllowanceSpent {
        token: Address,
        spender: Address,
        amount: U256,
    },
    PermitSet {
        fingerprint: B256,
        spender: Address,
        count: U256,
    },
    PermitSpent {
        fingerprint: B256,
        spender: Address,
    },
}
