//! Cached EIP-712 domain separator.

use alloy_primitives::{Address, B256};
use duo_account_types::domain_separator;

/// Domain separator computed at construction and reused while the chain id is unchanged.
///
/// After a fork the observed chain id differs and the value is recomputed on the fly; the cache is
/// never rewritten, so reads stay side-effect free.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainSeparator {
    cached: B256,
    cached_chain_id: u64,
    verifying_contract: Address,
}

impl DomainSeparator {
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            cached: domain_separator(chain_id, verifying_contract),
            cached_chain_id: chain_id,
            verifying_contract,
        }
    }

    pub fn current(&self, chain_id: u64) -> B256 {
        if chain_id == self.cached_chain_id {
            self.cached
        } else {
            domain_separator(chain_id, self.verifying_contract)
        }
    }

    pub fn cached_chain_id(&self) -> u64 {
        self.cached_chain_id
    }
}
