//! Fingerprinting and typed-data hashing shared with off-chain tooling.

pub use duo_account_types::{
    batch_digest, batch_fingerprint, call_fingerprint, delegate_fingerprint, domain_separator,
    permit_fingerprint, ActionKind,
};
