//! The dual-authorization account.
//!
//! Every state-changing action needs two of the three principals (two owners, optional assistant):
//! the first authorization on an action fingerprint proposes it, a second one from a different
//! principal executes it. Authorizations arrive either as live calls or as signed `BatchExecute`
//! messages relayed by anyone.
//!
//! Two fast paths skip the second authorization once granted:
//! - allowances: a per-token budget a spender may withdraw;
//! - permits: a bounded number of executions of one exact call shape.
//!
//! Granting a fast path is itself asymmetric. An owner acting alone can only grant to the other
//! owner; granting to anyone else takes the account acting on itself (i.e. a dual-authorized
//! self-call) or the deploying factory recorded as `origin`.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolInterface, SolValue};
use duo_account_types::{batch_fingerprint, call_fingerprint, delegate_fingerprint, permit_fingerprint};
use tracing::{debug, info, warn};

use crate::{
    allowance::AllowanceLedger,
    approvals::{Approval, ApprovalStore},
    config::AccountConfig,
    domain::DomainSeparator,
    errors::AccountError,
    events::AccountEvent,
    host::{
        constants::{NATIVE_TOKEN, WORD},
        interfaces::{IDuoAccount::IDuoAccountCalls, IERC20},
        Host, Reentry,
    },
    ownership::OwnershipRegistry,
    permit::PermitLedger,
    signatures::{verify_batch_signature, ConsumedSignatures, SignedBatch, VerifiedSignature},
};

/// Persisted account state. Restored wholesale when a top-level call fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AccountState {
    pub(crate) owners: OwnershipRegistry,
    pub(crate) approvals: ApprovalStore,
    pub(crate) signatures: ConsumedSignatures,
    pub(crate) allowances: AllowanceLedger,
    pub(crate) permits: PermitLedger,
    pub(crate) events: Vec<AccountEvent>,
}

/// What an authorization did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Execution {
    /// Recorded as pending; nothing was executed.
    Proposed { fingerprint: B256 },
    /// Confirmed and executed; one return value per performed call.
    Executed {
        fingerprint: B256,
        outputs: Vec<Bytes>,
    },
}

impl Execution {
    pub fn fingerprint(&self) -> B256 {
        match self {
            Execution::Proposed { fingerprint } | Execution::Executed { fingerprint, .. } => {
                *fingerprint
            }
        }
    }

    pub fn is_proposed(&self) -> bool {
        matches!(self, Execution::Proposed { .. })
    }

    /// ABI return value of a single-call entry point.
    fn into_output(self) -> Bytes {
        match self {
            Execution::Proposed { .. } => Bytes::new(),
            Execution::Executed { outputs, .. } => outputs.into_iter().next().unwrap_or_default(),
        }
    }
}

pub struct DuoAccount {
    pub(crate) address: Address,
    pub(crate) origin: Option<Address>,
    pub(crate) domain: DomainSeparator,
    pub(crate) state: AccountState,
    /// Set while a guarded entry point is in flight. Not part of [`AccountState`]: it never
    /// outlives the top-level call that set it.
    pub(crate) entered: bool,
    /// Error raised by the most recent callback into the account while an outgoing call was in
    /// flight.
    pub(crate) bounced: Option<AccountError>,
}

impl DuoAccount {
    /// Initialize an account from its configuration on chain `chain_id`.
    pub fn new(config: &AccountConfig, chain_id: u64) -> Result<Self, AccountError> {
        let (owners, events) =
            OwnershipRegistry::initialize(config.owners[0], config.owners[1], config.assistant)?;
        info!(
            account = %config.address,
            slot0 = %owners.slot0(),
            slot1 = %owners.slot1(),
            "account initialized"
        );
        Ok(Self {
            address: config.address,
            origin: config.origin,
            domain: DomainSeparator::new(chain_id, config.address),
            state: AccountState {
                owners,
                approvals: ApprovalStore::default(),
                signatures: ConsumedSignatures::default(),
                allowances: AllowanceLedger::default(),
                permits: PermitLedger::default(),
                events,
            },
            entered: false,
            bounced: None,
        })
    }

    /// Factory deployment: initialize, then run the setup calldata with the origin as caller.
    /// A failing setup call aborts the deployment.
    pub fn deploy(
        env: &mut dyn Host,
        config: &AccountConfig,
        setup: &[Bytes],
    ) -> Result<Self, AccountError> {
        let mut account = Self::new(config, env.chain_id())?;
        if !setup.is_empty() {
            let origin = config.origin.unwrap_or(Address::ZERO);
            account.atomically(env, |account, env| {
                for data in setup {
                    account.dispatch(env, origin, U256::ZERO, data)?;
                }
                Ok(())
            })?;
        }
        Ok(account)
    }

    /// Authorize a single call; the second distinct principal executes it.
    pub fn execute(
        &mut self,
        env: &mut dyn Host,
        caller: Address,
        to: Address,
        value: U256,
        data: &[u8],
        nonce: U256,
    ) -> Result<Execution, AccountError> {
        self.non_reentrant(env, |account, env| {
            let fingerprint = call_fingerprint(to, value, data, nonce);
            if !account.authorize(caller, fingerprint)? {
                return Ok(Execution::Proposed { fingerprint });
            }
            let output = account.call_out(env, to, value, data)?;
            Ok(Execution::Executed {
                fingerprint,
                outputs: vec![output],
            })
        })
    }

    /// Authorize a call that runs `to`'s code in the account's context.
    pub fn delegate_execute(
        &mut self,
        env: &mut dyn Host,
        caller: Address,
        to: Address,
        data: &[u8],
        nonce: U256,
    ) -> Result<Execution, AccountError> {
        self.non_reentrant(env, |account, env| {
            let fingerprint = delegate_fingerprint(to, data, nonce);
            if !account.authorize(caller, fingerprint)? {
                return Ok(Execution::Proposed { fingerprint });
            }
            let output = account.delegate_out(env, to, data)?;
            Ok(Execution::Executed {
                fingerprint,
                outputs: vec![output],
            })
        })
    }

    /// Authorize an ordered batch. Executes all-or-nothing on confirmation.
    pub fn batch_execute(
        &mut self,
        env: &mut dyn Host,
        caller: Address,
        tos: &[Address],
        values: &[U256],
        datas: &[Bytes],
        nonce: U256,
    ) -> Result<Execution, AccountError> {
        if tos.len() != values.len() || tos.len() != datas.len() {
            return Err(AccountError::WrongLen);
        }
        self.non_reentrant(env, |account, env| {
            let fingerprint = batch_fingerprint(tos, values, datas, nonce);
            if !account.authorize(caller, fingerprint)? {
                return Ok(Execution::Proposed { fingerprint });
            }
            let outputs = account.run_batch(env, tos, values, datas)?;
            Ok(Execution::Executed {
                fingerprint,
                outputs,
            })
        })
    }

    /// Authorize a batch with an offline signature. The relayer's identity is irrelevant; the
    /// recovered signer is the authorizing principal.
    pub fn batch_execute_with_sig(
        &mut self,
        env: &mut dyn Host,
        batch: &SignedBatch<'_>,
    ) -> Result<Execution, AccountError> {
        self.non_reentrant(env, |account, env| {
            let domain = account.domain.current(env.chain_id());
            let VerifiedSignature { signer, digest } =
                match verify_batch_signature(batch, domain, env.block_timestamp()) {
                    Ok(verified) => verified,
                    Err(err) => {
                        warn!(account = %account.address, %err, "batch signature rejected");
                        return Err(err);
                    }
                };
            if !account.state.owners.is_member(signer) {
                warn!(account = %account.address, %signer, "batch signed by a non-member");
                return Err(AccountError::NotOwner);
            }
            account.state.signatures.ensure_fresh(signer, digest)?;

            let fingerprint = batch_fingerprint(batch.tos, batch.values, batch.datas, batch.nonce);
            let confirmed = account.authorize(signer, fingerprint)?;
            account.state.signatures.consume(signer, digest)?;
            if !confirmed {
                return Ok(Execution::Proposed { fingerprint });
            }
            let outputs = account.run_batch(env, batch.tos, batch.values, batch.datas)?;
            Ok(Execution::Executed {
                fingerprint,
                outputs,
            })
        })
    }

    /// Withdraw a pending proposal. Only its proposer may.
    pub fn cancel(&mut self, caller: Address, fingerprint: B256) -> Result<(), AccountError> {
        self.state.approvals.cancel(fingerprint, caller)?;
        debug!(account = %self.address, %fingerprint, %caller, "proposal cancelled");
        self.emit(AccountEvent::Cancelled {
            fingerprint,
            proposer: caller,
        });
        Ok(())
    }

    pub fn set_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        token: Address,
        amount: U256,
    ) -> Result<(), AccountError> {
        let spender = self.grantee(caller, spender)?;
        self.state.allowances.set(token, spender, amount);
        info!(account = %self.address, %token, %spender, %amount, "allowance set");
        self.emit(AccountEvent::AllowanceSet {
            token,
            spender,
            amount,
        });
        Ok(())
    }

    /// Withdraw `amount` of `token` (native value for [`NATIVE_TOKEN`]) against the caller's budget.
    pub fn spend_allowance(
        &mut self,
        env: &mut dyn Host,
        caller: Address,
        token: Address,
        amount: U256,
    ) -> Result<(), AccountError> {
        self.non_reentrant(env, |account, env| {
            let remaining = account.state.allowances.spend(token, caller, amount)?;
            debug!(account = %account.address, %token, spender = %caller, %amount, %remaining, "allowance spent");
            account.emit(AccountEvent::AllowanceSpent {
                token,
                spender: caller,
                amount,
            });

            if token == NATIVE_TOKEN {
                account.call_out(env, caller, amount, &[])?;
                return Ok(());
            }
            let transfer = IERC20::transferCall {
                to: caller,
                amount,
            };
            let out = account.call_out(env, token, U256::ZERO, &SolCall::abi_encode(&transfer))?;
            // Tokens that return nothing are accepted; a returned word must be `true`.
            if !out.is_empty() && (out.len() < WORD || U256::from_be_slice(&out[..WORD]).is_zero()) {
                return Err(AccountError::ExternalCallFailed(out));
            }
            Ok(())
        })
    }

    /// Grant `count` executions of `(to, value, data)`.
    pub fn set_permit(
        &mut self,
        caller: Address,
        spender: Address,
        count: U256,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<(), AccountError> {
        let spender = self.grantee(caller, spender)?;
        let fingerprint = permit_fingerprint(to, value, data);
        self.state.permits.set(fingerprint, spender, count);
        info!(account = %self.address, %fingerprint, %spender, %count, "permit set");
        self.emit(AccountEvent::PermitSet {
            fingerprint,
            spender,
            count,
        });
        Ok(())
    }

    /// Execute a permitted call shape once.
    pub fn spend_permit(
        &mut self,
        env: &mut dyn Host,
        caller: Address,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Bytes, AccountError> {
        self.non_reentrant(env, |account, env| {
            let fingerprint = permit_fingerprint(to, value, data);
            let remaining = account.state.permits.spend(fingerprint, caller)?;
            debug!(account = %account.address, %fingerprint, spender = %caller, %remaining, "permit spent");
            account.emit(AccountEvent::PermitSpent {
                fingerprint,
                spender: caller,
            });
            account.call_out(env, to, value, data)
        })
    }

    /// Rotate the assistant. Only reachable through a dual-authorized self-call.
    pub fn set_assistant(&mut self, caller: Address, assistant: Address) -> Result<(), AccountError> {
        if caller != self.address {
            return Err(AccountError::NotOwner);
        }
        if let Some(event) = self.state.owners.set_assistant(assistant)? {
            info!(account = %self.address, %assistant, "assistant updated");
            self.emit(event);
        }
        Ok(())
    }

    /// Hand the caller's own primary slot to `new_owner`.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), AccountError> {
        let events = self.state.owners.transfer_slot(caller, new_owner)?;
        info!(account = %self.address, from = %caller, to = %new_owner, "ownership transferred");
        for event in events {
            self.emit(event);
        }
        Ok(())
    }

    /// Run each element as a call from `caller`, all-or-nothing.
    pub fn multicall(
        &mut self,
        env: &mut dyn Host,
        caller: Address,
        calls: &[Bytes],
    ) -> Result<Vec<Bytes>, AccountError> {
        self.atomically(env, |account, env| {
            calls
                .iter()
                .map(|data| account.dispatch(env, caller, U256::ZERO, data))
                .collect()
        })
    }

    /// Decode `data` as an `IDuoAccount` call from `caller` and run it.
    ///
    /// Empty calldata is a plain value transfer into the account and always succeeds; calldata that
    /// does not decode reverts without data.
    pub fn dispatch(
        &mut self,
        env: &mut dyn Host,
        caller: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Bytes, AccountError> {
        if data.is_empty() {
            debug!(account = %self.address, from = %caller, %value, "value received");
            return Ok(Bytes::new());
        }
        let call = IDuoAccountCalls::abi_decode(data, true)
            .map_err(|_| AccountError::ExternalCallFailed(Bytes::new()))?;

        match call {
            IDuoAccountCalls::execute(c) => self
                .execute(env, caller, c.to, c.value, &c.data, c.nonce)
                .map(Execution::into_output),
            IDuoAccountCalls::delegateExecute(c) => self
                .delegate_execute(env, caller, c.to, &c.data, c.nonce)
                .map(Execution::into_output),
            IDuoAccountCalls::batchExecute(c) => self
                .batch_execute(env, caller, &c.tos, &c.values, &c.datas, c.nonce)
                .map(|_| Bytes::new()),
            IDuoAccountCalls::batchExecuteWithSig(c) => {
                let batch = SignedBatch {
                    tos: &c.tos,
                    values: &c.values,
                    datas: &c.datas,
                    nonce: c.nonce,
                    deadline: c.deadline,
                    signature: &c.signature,
                };
                self.batch_execute_with_sig(env, &batch).map(|_| Bytes::new())
            }
            IDuoAccountCalls::cancel(c) => self.cancel(caller, c.fingerprint).map(|_| Bytes::new()),
            IDuoAccountCalls::setAllowance(c) => self
                .set_allowance(caller, c.spender, c.token, c.amount)
                .map(|_| Bytes::new()),
            IDuoAccountCalls::spendAllowance(c) => self
                .spend_allowance(env, caller, c.token, c.amount)
                .map(|_| Bytes::new()),
            IDuoAccountCalls::setPermit(c) => self
                .set_permit(caller, c.spender, c.count, c.to, c.value, &c.data)
                .map(|_| Bytes::new()),
            IDuoAccountCalls::spendPermit(c) => self.spend_permit(env, caller, c.to, c.value, &c.data),
            IDuoAccountCalls::setAssistant(c) => {
                self.set_assistant(caller, c.assistant).map(|_| Bytes::new())
            }
            IDuoAccountCalls::transferOwnership(c) => self
                .transfer_ownership(caller, c.newOwner)
                .map(|_| Bytes::new()),
            IDuoAccountCalls::multicall(c) => self
                .multicall(env, caller, &c.data)
                .map(|outputs| Bytes::from(SolValue::abi_encode(&outputs))),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn origin(&self) -> Option<Address> {
        self.origin
    }

    /// `(slot0, slot1)`, ascending.
    pub fn owners(&self) -> (Address, Address) {
        (self.state.owners.slot0(), self.state.owners.slot1())
    }

    pub fn assistant(&self) -> Option<Address> {
        self.state.owners.assistant()
    }

    pub fn pending_proposer(&self, fingerprint: B256) -> Option<Address> {
        self.state.approvals.proposer(fingerprint)
    }

    pub fn pending_count(&self) -> usize {
        self.state.approvals.len()
    }

    pub fn allowance(&self, token: Address, spender: Address) -> U256 {
        self.state.allowances.get(token, spender)
    }

    pub fn permit(&self, fingerprint: B256, spender: Address) -> U256 {
        self.state.permits.get(fingerprint, spender)
    }

    pub fn permit_for(&self, to: Address, value: U256, data: &[u8], spender: Address) -> U256 {
        self.permit(permit_fingerprint(to, value, data), spender)
    }

    pub fn is_consumed(&self, signer: Address, digest: B256) -> bool {
        self.state.signatures.is_consumed(signer, digest)
    }

    /// Domain separator as observed on `chain_id`.
    pub fn domain_separator(&self, chain_id: u64) -> B256 {
        self.domain.current(chain_id)
    }

    pub fn events(&self) -> &[AccountEvent] {
        &self.state.events
    }

    /// Role check plus propose/confirm. `Ok(true)` means the action must execute now.
    fn authorize(&mut self, principal: Address, fingerprint: B256) -> Result<bool, AccountError> {
        if !self.state.owners.is_member(principal) {
            return Err(AccountError::NotOwner);
        }
        match self.state.approvals.propose_or_confirm(fingerprint, principal)? {
            Approval::Proposed => {
                info!(account = %self.address, %fingerprint, proposer = %principal, "action proposed");
                self.emit(AccountEvent::Proposed {
                    fingerprint,
                    proposer: principal,
                });
                Ok(false)
            }
            Approval::Confirmed { proposer } => {
                info!(account = %self.address, %fingerprint, %proposer, confirmer = %principal, "action confirmed");
                self.emit(AccountEvent::Executed {
                    fingerprint,
                    proposer,
                    confirmer: principal,
                });
                Ok(true)
            }
        }
    }

    /// Spender of a fast-path grant: the co-owner for an owner acting alone, anyone for the account
    /// itself or its origin.
    fn grantee(&self, caller: Address, requested: Address) -> Result<Address, AccountError> {
        if let Some(co_owner) = self.state.owners.co_owner(caller) {
            if requested != co_owner {
                debug!(account = %self.address, %caller, %requested, %co_owner, "direct grant redirected to co-owner");
            }
            return Ok(co_owner);
        }
        if caller == self.address || Some(caller) == self.origin {
            return Ok(requested);
        }
        Err(AccountError::NotOwner)
    }

    fn emit(&mut self, event: AccountEvent) {
        self.state.events.push(event);
    }
}

impl Reentry for DuoAccount {
    fn address(&self) -> Address {
        self.address
    }

    fn reenter(
        &mut self,
        host: &mut dyn Host,
        caller: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Bytes, Bytes> {
        self.dispatch(host, caller, value, data).map_err(|err| {
            let data = err.revert_data();
            self.bounced = Some(err);
            data
        })
    }
}
