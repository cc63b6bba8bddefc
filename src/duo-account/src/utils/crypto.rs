//! secp256k1 signature handling for offline batch authorizations.
//!
//! Signatures are 65 bytes `r || s || v`. Only the lower-half `s` form is accepted, so a signature
//! cannot be re-shaped into a second valid encoding of the same authorization.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

use crate::errors::AccountError;

/// `n / 2` for the secp256k1 group order.
pub const SECP256K1_HALF_ORDER: U256 = U256::from_limbs([
    0xDFE9_2F46_681B_20A0,
    0x5D57_6E73_57A4_501D,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
]);

pub const SIGNATURE_LEN: usize = 65;

/// Recover the signer of `digest`. Whether the signer may act is left to the membership check.
///
/// Notes:
/// - We accept v in {0,1,27,28}.
/// - High-`s` signatures are rejected before recovery is attempted.
pub fn recover_signer(digest: B256, sig: &[u8]) -> Result<Address, AccountError> {
    if sig.len() != SIGNATURE_LEN {
        return Err(AccountError::BadSign);
    }
    let s = U256::from_be_slice(&sig[32..64]);
    if s > SECP256K1_HALF_ORDER {
        return Err(AccountError::BadSign);
    }
    let v = match sig[64] {
        27 | 28 => sig[64] - 27,
        0 | 1 => sig[64],
        _ => return Err(AccountError::BadSign),
    };
    let recovery_id = RecoveryId::from_byte(v).ok_or(AccountError::BadSign)?;
    let signature = Signature::from_slice(&sig[..64]).map_err(|_| AccountError::BadSign)?;
    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
        .map_err(|_| AccountError::BadSign)?;
    Ok(address_of(&key))
}

/// Ethereum address of a public key: the low 20 bytes of `keccak256(x || y)`.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Sign `digest` and return the 65-byte `r || s || v` encoding with `v` in {27, 28}.
pub fn sign_digest(key: &SigningKey, digest: B256) -> Result<Bytes, k256::ecdsa::Error> {
    let (signature, recovery_id) = key.sign_prehash_recoverable(digest.as_slice())?;
    let mut out = Vec::with_capacity(SIGNATURE_LEN);
    out.extend_from_slice(&signature.to_bytes());
    out.push(recovery_id.to_byte() + 27);
    Ok(Bytes::from(out))
}
