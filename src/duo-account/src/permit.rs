//! Permit ledger: (action shape fingerprint, spender) -> remaining executions.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};

use crate::errors::AccountError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermitLedger {
    counts: BTreeMap<(B256, Address), U256>,
}

impl PermitLedger {
    pub fn get(&self, fingerprint: B256, spender: Address) -> U256 {
        self.counts
            .get(&(fingerprint, spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn set(&mut self, fingerprint: B256, spender: Address, count: U256) {
        if count.is_zero() {
            self.counts.remove(&(fingerprint, spender));
        } else {
            self.counts.insert((fingerprint, spender), count);
        }
    }

    /// Use one execution.
    pub fn spend(&mut self, fingerprint: B256, spender: Address) -> Result<U256, AccountError> {
        let remaining = self
            .get(fingerprint, spender)
            .checked_sub(U256::from(1u64))
            .ok_or(AccountError::InsufficientBudget)?;
        self.set(fingerprint, spender, remaining);
        Ok(remaining)
    }
}
