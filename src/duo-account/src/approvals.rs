//! Pending approvals: fingerprint -> the one principal currently waiting for a confirmation.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256};

use crate::errors::AccountError;

/// Outcome of an authorization on a fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Approval {
    /// First authorization; the caller is now the pending proposer.
    Proposed,
    /// Second authorization by a different principal; the pending record has been cleared.
    Confirmed { proposer: Address },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApprovalStore {
    pending: BTreeMap<B256, Address>,
}

impl ApprovalStore {
    pub fn proposer(&self, fingerprint: B256) -> Option<Address> {
        self.pending.get(&fingerprint).copied()
    }

    /// Record `caller` as proposer, or consume the pending proposal if someone else proposed it.
    pub fn propose_or_confirm(
        &mut self,
        fingerprint: B256,
        caller: Address,
    ) -> Result<Approval, AccountError> {
        match self.pending.get(&fingerprint).copied() {
            None => {
                self.pending.insert(fingerprint, caller);
                Ok(Approval::Proposed)
            }
            Some(proposer) if proposer == caller => Err(AccountError::AlreadyApproved),
            Some(proposer) => {
                self.pending.remove(&fingerprint);
                Ok(Approval::Confirmed { proposer })
            }
        }
    }

    /// Drop a pending proposal. Only its proposer may do so.
    pub fn cancel(&mut self, fingerprint: B256, caller: Address) -> Result<(), AccountError> {
        match self.pending.get(&fingerprint) {
            Some(proposer) if *proposer == caller => {
                self.pending.remove(&fingerprint);
                Ok(())
            }
            _ => Err(AccountError::NotApprover),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
