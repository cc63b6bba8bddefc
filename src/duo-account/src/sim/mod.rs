//! In-memory ledger for exercising accounts off-chain.
//!
//! `SimHost` keeps native balances, ERC-20 token ledgers and a handful of scripted contract
//! behaviours. Every call runs in its own checkpoint, so a reverting callee leaves nothing behind,
//! and the account's own frames nest their checkpoints on the same stack.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolInterface;

use crate::host::{interfaces::IERC20::IERC20Calls, Host, Reentry};

/// Scripted code at an address. Addresses without a behaviour accept everything (EOAs).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Behavior {
    /// Accept the call and return nothing.
    Sink,
    /// Accept the call and return fixed data.
    Return(Bytes),
    /// Revert with fixed data.
    Revert(Bytes),
    /// Call back into the calling account with this calldata and return its result.
    Reenter(Bytes),
}

/// A call that completed (reverted calls leave no record).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRecord {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub delegated: bool,
}

#[derive(Clone, Debug, Default)]
struct World {
    balances: BTreeMap<Address, U256>,
    tokens: BTreeMap<Address, BTreeMap<Address, U256>>,
    code: BTreeMap<Address, Behavior>,
    calls: Vec<CallRecord>,
}

#[derive(Debug)]
pub struct SimHost {
    chain_id: u64,
    timestamp: u64,
    world: World,
    checkpoints: Vec<World>,
}

impl SimHost {
    pub fn new(chain_id: u64, timestamp: u64) -> Self {
        Self {
            chain_id,
            timestamp,
            world: World::default(),
            checkpoints: Vec::new(),
        }
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Simulate a chain split: same world, new chain id.
    pub fn set_chain_id(&mut self, chain_id: u64) {
        self.chain_id = chain_id;
    }

    pub fn fund(&mut self, who: Address, amount: U256) {
        let balance = self.world.balances.entry(who).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn balance(&self, who: Address) -> U256 {
        self.world.balances.get(&who).copied().unwrap_or_default()
    }

    /// Register an ERC-20 ledger at `token`.
    pub fn deploy_token(&mut self, token: Address) {
        self.world.tokens.entry(token).or_default();
    }

    pub fn mint(&mut self, token: Address, to: Address, amount: U256) {
        let balance = self
            .world
            .tokens
            .entry(token)
            .or_default()
            .entry(to)
            .or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn token_balance(&self, token: Address, owner: Address) -> U256 {
        self.world
            .tokens
            .get(&token)
            .and_then(|ledger| ledger.get(&owner))
            .copied()
            .unwrap_or_default()
    }

    pub fn install(&mut self, at: Address, behavior: Behavior) {
        self.world.code.insert(at, behavior);
    }

    pub fn calls(&self) -> &[CallRecord] {
        &self.world.calls
    }

    fn move_value(&mut self, from: Address, to: Address, value: U256) -> Result<(), Bytes> {
        if value.is_zero() {
            return Ok(());
        }
        let remaining = self.balance(from).checked_sub(value).ok_or_else(Bytes::new)?;
        self.world.balances.insert(from, remaining);
        self.fund(to, value);
        Ok(())
    }

    fn token_call(&mut self, token: Address, from: Address, data: &[u8]) -> Result<Bytes, Bytes> {
        let call = IERC20Calls::abi_decode(data, true).map_err(|_| Bytes::new())?;
        match call {
            IERC20Calls::transfer(c) => {
                let ledger = self.world.tokens.entry(token).or_default();
                let remaining = ledger
                    .get(&from)
                    .copied()
                    .unwrap_or_default()
                    .checked_sub(c.amount)
                    .ok_or_else(|| Bytes::from_static(b"ERC20: transfer amount exceeds balance"))?;
                ledger.insert(from, remaining);
                let credited = ledger.entry(c.to).or_default();
                *credited = credited.saturating_add(c.amount);
                Ok(word(U256::from(1u64)))
            }
            IERC20Calls::balanceOf(c) => Ok(word(self.token_balance(token, c.owner))),
        }
    }

    fn run(
        &mut self,
        account: &mut dyn Reentry,
        record: CallRecord,
    ) -> Result<Bytes, Bytes> {
        if !record.delegated {
            self.move_value(record.from, record.to, record.value)?;
            if self.world.tokens.contains_key(&record.to) {
                return self.token_call(record.to, record.from, &record.data);
            }
        }

        let behavior = self.world.code.get(&record.to).cloned();
        // Delegated code acts as the account itself.
        let callback_sender = if record.delegated {
            account.address()
        } else {
            record.to
        };
        match behavior {
            None | Some(Behavior::Sink) => {
                self.world.calls.push(record);
                Ok(Bytes::new())
            }
            Some(Behavior::Return(out)) => {
                self.world.calls.push(record);
                Ok(out)
            }
            Some(Behavior::Revert(data)) => Err(data),
            Some(Behavior::Reenter(inner)) => {
                self.world.calls.push(record);
                account.reenter(self, callback_sender, U256::ZERO, &inner)
            }
        }
    }

    fn framed(&mut self, account: &mut dyn Reentry, record: CallRecord) -> Result<Bytes, Bytes> {
        let checkpoint = self.checkpoint();
        let result = self.run(account, record);
        match result {
            Ok(_) => self.commit(checkpoint),
            Err(_) => self.revert_to(checkpoint),
        }
        result
    }
}

impl Host for SimHost {
    fn block_timestamp(&self) -> u64 {
        self.timestamp
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn call(
        &mut self,
        account: &mut dyn Reentry,
        from: Address,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Bytes, Bytes> {
        let record = CallRecord {
            from,
            to,
            value,
            data: Bytes::copy_from_slice(data),
            delegated: false,
        };
        self.framed(account, record)
    }

    fn delegate_call(
        &mut self,
        account: &mut dyn Reentry,
        from: Address,
        target: Address,
        data: &[u8],
    ) -> Result<Bytes, Bytes> {
        let record = CallRecord {
            from,
            to: target,
            value: U256::ZERO,
            data: Bytes::copy_from_slice(data),
            delegated: true,
        };
        self.framed(account, record)
    }

    fn checkpoint(&mut self) -> usize {
        self.checkpoints.push(self.world.clone());
        self.checkpoints.len() - 1
    }

    fn commit(&mut self, checkpoint: usize) {
        self.checkpoints.truncate(checkpoint);
    }

    fn revert_to(&mut self, checkpoint: usize) {
        self.checkpoints.truncate(checkpoint + 1);
        if let Some(saved) = self.checkpoints.pop() {
            self.world = saved;
        }
    }
}

fn word(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoAccount;

    impl Reentry for NoAccount {
        fn address(&self) -> Address {
            Address::ZERO
        }

        fn reenter(&mut self, _: &mut dyn Host, _: Address, _: U256, _: &[u8]) -> Result<Bytes, Bytes> {
            Err(Bytes::new())
        }
    }

    const ALICE: Address = Address::repeat_byte(0x0A);
    const BOB: Address = Address::repeat_byte(0x0B);

    #[test]
    fn value_moves_and_reverts_with_the_call() {
        let mut host = SimHost::new(1, 0);
        host.fund(ALICE, U256::from(10u64));
        host.call(&mut NoAccount, ALICE, BOB, U256::from(4u64), &[]).unwrap();
        assert_eq!(host.balance(BOB), U256::from(4u64));

        host.install(BOB, Behavior::Revert(Bytes::from_static(b"no")));
        let err = host.call(&mut NoAccount, ALICE, BOB, U256::from(4u64), &[]).unwrap_err();
        assert_eq!(err, Bytes::from_static(b"no"));
        assert_eq!(host.balance(ALICE), U256::from(6u64));
        assert_eq!(host.calls().len(), 1);
    }

    #[test]
    fn overdraft_reverts_without_data() {
        let mut host = SimHost::new(1, 0);
        let err = host.call(&mut NoAccount, ALICE, BOB, U256::from(1u64), &[]).unwrap_err();
        assert!(err.is_empty());
    }

    #[test]
    fn checkpoints_nest() {
        let mut host = SimHost::new(1, 0);
        let outer = host.checkpoint();
        host.fund(ALICE, U256::from(1u64));
        let inner = host.checkpoint();
        host.fund(ALICE, U256::from(1u64));
        host.revert_to(inner);
        assert_eq!(host.balance(ALICE), U256::from(1u64));
        host.revert_to(outer);
        assert_eq!(host.balance(ALICE), U256::ZERO);
    }
}
