//! Allowance ledger: (token, spender) -> remaining spend budget.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};

use crate::errors::AccountError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowanceLedger {
    budgets: BTreeMap<(Address, Address), U256>,
}

impl AllowanceLedger {
    pub fn get(&self, token: Address, spender: Address) -> U256 {
        self.budgets
            .get(&(token, spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Overwrite the budget. A zero amount removes the entry.
    pub fn set(&mut self, token: Address, spender: Address, amount: U256) {
        if amount.is_zero() {
            self.budgets.remove(&(token, spender));
        } else {
            self.budgets.insert((token, spender), amount);
        }
    }

    /// Deduct `amount`, leaving the ledger untouched when the budget does not cover it.
    pub fn spend(
        &mut self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<U256, AccountError> {
        let remaining = self
            .get(token, spender)
            .checked_sub(amount)
            .ok_or(AccountError::InsufficientBudget)?;
        self.set(token, spender, remaining);
        Ok(remaining)
    }
}
