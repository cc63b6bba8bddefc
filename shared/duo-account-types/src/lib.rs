//! Shared hashing for Duo accounts.
//!
//! The account itself and the off-chain tooling (signers, relayers) must agree byte-for-byte on
//! how an action is fingerprinted and how a batch authorization is turned into an EIP-712 digest.
//! Everything here is pure and allocation-light so it can be used on both sides.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod fingerprint;
pub mod typed_data;

pub use fingerprint::{
    batch_fingerprint, call_fingerprint, delegate_fingerprint, permit_fingerprint, ActionKind,
};
pub use typed_data::{
    batch_digest, batch_struct_hash, domain_separator, hash_addresses, hash_payloads, hash_values,
    typed_digest, DOMAIN_NAME, DOMAIN_VERSION,
};
