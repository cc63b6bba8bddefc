//! Execution engine: outgoing calls, atomic frames and the reentrancy guard.
//!
//! A frame snapshots the account state and opens a host checkpoint; on error both are restored, so
//! a failure anywhere in a top-level call leaves no trace (batches included). The guard flag lives
//! on the account handle rather than in [`AccountState`](crate::account::AccountState) and is
//! cleared when the guarded call returns, whatever the outcome.

use alloy_primitives::{Address, Bytes, U256};
use tracing::{debug, warn};

use crate::{account::DuoAccount, errors::AccountError, host::Host};

impl DuoAccount {
    /// Run `f` as one commit-or-abort unit over account state and host world state.
    pub(crate) fn atomically<T>(
        &mut self,
        env: &mut dyn Host,
        f: impl FnOnce(&mut Self, &mut dyn Host) -> Result<T, AccountError>,
    ) -> Result<T, AccountError> {
        let saved = self.state.clone();
        let checkpoint = env.checkpoint();
        match f(&mut *self, &mut *env) {
            Ok(out) => {
                env.commit(checkpoint);
                Ok(out)
            }
            Err(err) => {
                env.revert_to(checkpoint);
                self.state = saved;
                debug!(account = %self.address, %err, "frame reverted");
                Err(err)
            }
        }
    }

    /// [`DuoAccount::atomically`], refusing to start while another guarded call is in flight.
    pub(crate) fn non_reentrant<T>(
        &mut self,
        env: &mut dyn Host,
        f: impl FnOnce(&mut Self, &mut dyn Host) -> Result<T, AccountError>,
    ) -> Result<T, AccountError> {
        if self.entered {
            warn!(account = %self.address, "reentrant call rejected");
            return Err(AccountError::Reentrancy);
        }
        self.entered = true;
        let result = self.atomically(env, f);
        self.entered = false;
        result
    }

    /// Message call from the account. Calls to the account itself are dispatched in place with the
    /// account as caller, which is what unlocks self-call-only entry points.
    pub(crate) fn call_out(
        &mut self,
        env: &mut dyn Host,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Bytes, AccountError> {
        let from = self.address;
        if to == from {
            return self.dispatch(env, from, value, data);
        }
        debug!(account = %from, %to, %value, len = data.len(), "call");
        self.bounced = None;
        let result = env.call(self, from, to, value, data);
        self.settle(result)
    }

    pub(crate) fn delegate_out(
        &mut self,
        env: &mut dyn Host,
        target: Address,
        data: &[u8],
    ) -> Result<Bytes, AccountError> {
        let from = self.address;
        debug!(account = %from, %target, len = data.len(), "delegatecall");
        self.bounced = None;
        let result = env.delegate_call(self, from, target, data);
        self.settle(result)
    }

    /// Revert data is our own error only if a callback into this account raised it and it came
    /// back out unchanged. Everything else belongs to the callee.
    fn settle(&mut self, result: Result<Bytes, Bytes>) -> Result<Bytes, AccountError> {
        let bounced = self.bounced.take();
        result.map_err(|data| match bounced {
            Some(err) if err.revert_data() == data => err,
            _ => AccountError::ExternalCallFailed(data),
        })
    }

    /// Perform every call in order; the first failure aborts the rest and is returned unchanged.
    pub(crate) fn run_batch(
        &mut self,
        env: &mut dyn Host,
        tos: &[Address],
        values: &[U256],
        datas: &[Bytes],
    ) -> Result<Vec<Bytes>, AccountError> {
        let mut outputs = Vec::with_capacity(tos.len());
        for ((to, value), data) in tos.iter().zip(values).zip(datas) {
            outputs.push(self.call_out(env, *to, *value, data)?);
        }
        Ok(outputs)
    }
}
