//! Offline batch authorizations.
//!
//! A principal may authorize a batch by signing the `BatchExecute` typed message instead of calling
//! the account. Anyone can relay the signature. Each (signer, digest) pair authorizes exactly once.

use std::collections::BTreeSet;

use alloy_primitives::{Address, Bytes, B256, U256};
use duo_account_types::batch_digest;

use crate::{errors::AccountError, utils::crypto::recover_signer};

/// A relayed, signed batch authorization.
#[derive(Clone, Copy, Debug)]
pub struct SignedBatch<'a> {
    pub tos: &'a [Address],
    pub values: &'a [U256],
    pub datas: &'a [Bytes],
    pub nonce: U256,
    pub deadline: U256,
    pub signature: &'a [u8],
}

impl SignedBatch<'_> {
    pub fn lengths_match(&self) -> bool {
        self.tos.len() == self.values.len() && self.tos.len() == self.datas.len()
    }

    pub fn digest(&self, domain_separator: B256) -> B256 {
        batch_digest(
            domain_separator,
            self.tos,
            self.values,
            self.datas,
            self.nonce,
            self.deadline,
        )
    }
}

/// Result of the stateless checks: who signed, and what exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifiedSignature {
    pub signer: Address,
    pub digest: B256,
}

/// Length, expiry, digest and signer recovery. Membership and replay are checked by the caller.
pub fn verify_batch_signature(
    batch: &SignedBatch<'_>,
    domain_separator: B256,
    now: u64,
) -> Result<VerifiedSignature, AccountError> {
    if !batch.lengths_match() {
        return Err(AccountError::WrongLen);
    }
    if U256::from(now) > batch.deadline {
        return Err(AccountError::Expired);
    }
    let digest = batch.digest(domain_separator);
    let signer = recover_signer(digest, batch.signature)?;
    Ok(VerifiedSignature { signer, digest })
}

/// (signer, digest) pairs that already authorized something.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsumedSignatures {
    consumed: BTreeSet<(Address, B256)>,
}

impl ConsumedSignatures {
    pub fn is_consumed(&self, signer: Address, digest: B256) -> bool {
        self.consumed.contains(&(signer, digest))
    }

    pub fn ensure_fresh(&self, signer: Address, digest: B256) -> Result<(), AccountError> {
        if self.is_consumed(signer, digest) {
            return Err(AccountError::Signed);
        }
        Ok(())
    }

    pub fn consume(&mut self, signer: Address, digest: B256) -> Result<(), AccountError> {
        if !self.consumed.insert((signer, digest)) {
            return Err(AccountError::Signed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::{address_of, sign_digest};
    use k256::ecdsa::SigningKey;

    const DOMAIN: B256 = B256::repeat_byte(0xD0);

    fn batch<'a>(tos: &'a [Address], values: &'a [U256], datas: &'a [Bytes], sig: &'a [u8]) -> SignedBatch<'a> {
        SignedBatch {
            tos,
            values,
            datas,
            nonce: U256::from(1u64),
            deadline: U256::from(1_000u64),
            signature: sig,
        }
    }

    #[test]
    fn recovers_signer_over_the_typed_digest() {
        let key = SigningKey::from_slice(&[3u8; 32]).unwrap();
        let tos = [Address::repeat_byte(1)];
        let values = [U256::ZERO];
        let datas = [Bytes::from_static(b"hi")];
        let unsigned = batch(&tos, &values, &datas, &[]);
        let sig = sign_digest(&key, unsigned.digest(DOMAIN)).unwrap();

        let verified = verify_batch_signature(&batch(&tos, &values, &datas, &sig), DOMAIN, 999).unwrap();
        assert_eq!(verified.signer, address_of(key.verifying_key()));
        assert_eq!(verified.digest, unsigned.digest(DOMAIN));
    }

    #[test]
    fn rejects_mismatched_lengths_first() {
        let tos = [Address::repeat_byte(1)];
        let result = verify_batch_signature(&batch(&tos, &[], &[], &[]), DOMAIN, 0);
        assert_eq!(result, Err(AccountError::WrongLen));
    }

    #[test]
    fn rejects_after_deadline() {
        let result = verify_batch_signature(&batch(&[], &[], &[], &[0u8; 65]), DOMAIN, 1_001);
        assert_eq!(result, Err(AccountError::Expired));
    }

    #[test]
    fn deadline_is_inclusive() {
        let result = verify_batch_signature(&batch(&[], &[], &[], &[0u8; 65]), DOMAIN, 1_000);
        assert_eq!(result, Err(AccountError::BadSign));
    }

    #[test]
    fn pairs_are_consumed_once() {
        let mut consumed = ConsumedSignatures::default();
        let signer = Address::repeat_byte(9);
        consumed.ensure_fresh(signer, DOMAIN).unwrap();
        consumed.consume(signer, DOMAIN).unwrap();
        assert_eq!(consumed.ensure_fresh(signer, DOMAIN), Err(AccountError::Signed));
        assert_eq!(consumed.consume(signer, DOMAIN), Err(AccountError::Signed));
        assert!(!consumed.is_consumed(Address::repeat_byte(8), DOMAIN));
    }
}
