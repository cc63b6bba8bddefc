//! The ledger the account lives on.
//!
//! The account never talks to the outside world directly: block time, chain identity and every
//! outgoing call go through a [`Host`]. A host that lets a called contract call back into the
//! account does so through [`Reentry`], which routes the callback into the regular ABI dispatcher
//! (and therefore through the reentrancy guard).

pub mod constants;
pub mod interfaces;

use alloy_primitives::{Address, Bytes, U256};

/// Execution environment of an account.
///
/// Calls return `Ok(returndata)` or `Err(revertdata)`. World-state atomicity is exposed through
/// checkpoints: every checkpoint is eventually either committed or reverted to, innermost first.
pub trait Host {
    fn block_timestamp(&self) -> u64;

    fn chain_id(&self) -> u64;

    /// Message call from `from` to `to`, forwarding `value` native units.
    fn call(
        &mut self,
        account: &mut dyn Reentry,
        from: Address,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Bytes, Bytes>;

    /// Run `target`'s code in the context of `from` (no value transfer, caller identity preserved).
    fn delegate_call(
        &mut self,
        account: &mut dyn Reentry,
        from: Address,
        target: Address,
        data: &[u8],
    ) -> Result<Bytes, Bytes>;

    fn checkpoint(&mut self) -> usize;

    fn commit(&mut self, checkpoint: usize);

    fn revert_to(&mut self, checkpoint: usize);
}

/// Callback surface of an account, handed to the host for the duration of an outgoing call.
pub trait Reentry {
    fn address(&self) -> Address;

    /// Deliver an ABI-encoded call to the account as if `caller` had sent it.
    fn reenter(
        &mut self,
        host: &mut dyn Host,
        caller: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Bytes, Bytes>;
}
