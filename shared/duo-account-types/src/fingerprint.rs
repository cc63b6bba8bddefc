//! Action fingerprints.
//!
//! A fingerprint identifies one specific proposed action and keys the approval ledger (and, without
//! a nonce, the permit ledger). The preimage is the ABI encoding of fixed 32-byte words, led by the
//! operation-kind discriminant so that a call and a batch can never alias.

use alloc::vec::Vec;

use alloy_primitives::{keccak256, Address, B256, U256};

use crate::typed_data::{hash_addresses, hash_payloads, hash_values};

/// Operation kinds that can be fingerprinted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ActionKind {
    Call = 0x01,
    DelegateCall = 0x02,
    Batch = 0x03,
    Permit = 0x04,
}

impl ActionKind {
    fn word(self) -> [u8; 32] {
        U256::from(self as u8).to_be_bytes::<32>()
    }
}

impl TryFrom<u8> for ActionKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let kind = match value {
            0x01 => ActionKind::Call,
            0x02 => ActionKind::DelegateCall,
            0x03 => ActionKind::Batch,
            0x04 => ActionKind::Permit,
            _ => return Err(()),
        };
        Ok(kind)
    }
}

fn single(kind: ActionKind, to: Address, value: U256, data: &[u8], nonce: Option<U256>) -> B256 {
    let mut buf = Vec::with_capacity(32 * 5);
    buf.extend_from_slice(&kind.word());
    buf.extend_from_slice(to.into_word().as_slice());
    buf.extend_from_slice(&value.to_be_bytes::<32>());
    buf.extend_from_slice(keccak256(data).as_slice());
    if let Some(nonce) = nonce {
        buf.extend_from_slice(&nonce.to_be_bytes::<32>());
    }
    keccak256(buf)
}

/// Fingerprint of a single external call.
pub fn call_fingerprint(to: Address, value: U256, data: &[u8], nonce: U256) -> B256 {
    single(ActionKind::Call, to, value, data, Some(nonce))
}

/// Fingerprint of a delegated-context call (no value is forwarded).
pub fn delegate_fingerprint(to: Address, data: &[u8], nonce: U256) -> B256 {
    single(ActionKind::DelegateCall, to, U256::ZERO, data, Some(nonce))
}

/// Fingerprint of a repeatable action shape. Permits carry no nonce.
pub fn permit_fingerprint(to: Address, value: U256, data: &[u8]) -> B256 {
    single(ActionKind::Permit, to, value, data, None)
}

/// Fingerprint of an ordered batch.
pub fn batch_fingerprint<D: AsRef<[u8]>>(
    tos: &[Address],
    values: &[U256],
    datas: &[D],
    nonce: U256,
) -> B256 {
    let mut buf = Vec::with_capacity(32 * 5);
    buf.extend_from_slice(&ActionKind::Batch.word());
    buf.extend_from_slice(hash_addresses(tos).as_slice());
    buf.extend_from_slice(hash_values(values).as_slice());
    buf.extend_from_slice(hash_payloads(datas).as_slice());
    buf.extend_from_slice(&nonce.to_be_bytes::<32>());
    keccak256(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: Address = Address::repeat_byte(0x11);

    #[test]
    fn identical_inputs_give_identical_fingerprints() {
        let a = call_fingerprint(TARGET, U256::from(7u64), b"payload", U256::from(1u64));
        let b = call_fingerprint(TARGET, U256::from(7u64), b"payload", U256::from(1u64));
        assert_eq!(a, b);
    }

    #[test]
    fn every_field_is_bound() {
        let base = call_fingerprint(TARGET, U256::from(7u64), b"payload", U256::from(1u64));
        assert_ne!(
            base,
            call_fingerprint(Address::repeat_byte(0x12), U256::from(7u64), b"payload", U256::from(1u64))
        );
        assert_ne!(base, call_fingerprint(TARGET, U256::from(8u64), b"payload", U256::from(1u64)));
        assert_ne!(base, call_fingerprint(TARGET, U256::from(7u64), b"payload!", U256::from(1u64)));
        assert_ne!(base, call_fingerprint(TARGET, U256::from(7u64), b"payload", U256::from(2u64)));
    }

    #[test]
    fn kinds_never_alias() {
        let call = call_fingerprint(TARGET, U256::ZERO, b"x", U256::ZERO);
        let delegate = delegate_fingerprint(TARGET, b"x", U256::ZERO);
        let batch = batch_fingerprint(&[TARGET], &[U256::ZERO], &[b"x"], U256::ZERO);
        assert_ne!(call, delegate);
        assert_ne!(call, batch);
        assert_ne!(delegate, batch);
    }

    #[test]
    fn permit_fingerprint_ignores_nonce_space() {
        let permit = permit_fingerprint(TARGET, U256::from(3u64), b"x");
        assert_eq!(permit, permit_fingerprint(TARGET, U256::from(3u64), b"x"));
        assert_ne!(permit, call_fingerprint(TARGET, U256::from(3u64), b"x", U256::ZERO));
    }

    #[test]
    fn batch_order_matters() {
        let other = Address::repeat_byte(0x22);
        let forward = batch_fingerprint(
            &[TARGET, other],
            &[U256::ZERO, U256::ZERO],
            &[b"a".as_slice(), b"b".as_slice()],
            U256::ZERO,
        );
        let reversed = batch_fingerprint(
            &[other, TARGET],
            &[U256::ZERO, U256::ZERO],
            &[b"b".as_slice(), b"a".as_slice()],
            U256::ZERO,
        );
        assert_ne!(forward, reversed);
    }

    #[test]
    fn kind_discriminant_round_trips() {
        assert_eq!(ActionKind::try_from(0x03), Ok(ActionKind::Batch));
        assert_eq!(ActionKind::try_from(0x05), Err(()));
    }
}
