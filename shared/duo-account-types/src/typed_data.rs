//! EIP-712 domain separation and the `BatchExecute` typed message.
//!
//! Array members are encoded the EIP-712 way: `keccak256` over the concatenation of the 32-byte
//! encoding of each element (addresses left-padded, `bytes` elements replaced by their hash).

use alloc::vec::Vec;

use alloy_primitives::{keccak256, Address, B256, U256};

pub const DOMAIN_NAME: &str = "DuoAccount";
pub const DOMAIN_VERSION: &str = "1";

const DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
const BATCH_EXECUTE_TYPE: &[u8] =
    b"BatchExecute(address[] tos,uint256[] values,bytes[] datas,uint256 nonce,uint256 deadline)";

/// `keccak256(abi.encode(typeHash, nameHash, versionHash, chainId, verifyingContract))`.
pub fn domain_separator(chain_id: u64, verifying_contract: Address) -> B256 {
    let mut buf = Vec::with_capacity(32 * 5);
    buf.extend_from_slice(keccak256(DOMAIN_TYPE).as_slice());
    buf.extend_from_slice(keccak256(DOMAIN_NAME.as_bytes()).as_slice());
    buf.extend_from_slice(keccak256(DOMAIN_VERSION.as_bytes()).as_slice());
    buf.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
    buf.extend_from_slice(verifying_contract.into_word().as_slice());
    keccak256(buf)
}

pub fn hash_addresses(tos: &[Address]) -> B256 {
    let mut buf = Vec::with_capacity(32 * tos.len());
    for to in tos {
        buf.extend_from_slice(to.into_word().as_slice());
    }
    keccak256(buf)
}

pub fn hash_values(values: &[U256]) -> B256 {
    let mut buf = Vec::with_capacity(32 * values.len());
    for value in values {
        buf.extend_from_slice(&value.to_be_bytes::<32>());
    }
    keccak256(buf)
}

/// Hash of the list of payload hashes.
pub fn hash_payloads<D: AsRef<[u8]>>(datas: &[D]) -> B256 {
    let mut buf = Vec::with_capacity(32 * datas.len());
    for data in datas {
        buf.extend_from_slice(keccak256(data.as_ref()).as_slice());
    }
    keccak256(buf)
}

/// Struct hash of `BatchExecute(address[] tos,uint256[] values,bytes[] datas,uint256 nonce,uint256 deadline)`.
pub fn batch_struct_hash<D: AsRef<[u8]>>(
    tos: &[Address],
    values: &[U256],
    datas: &[D],
    nonce: U256,
    deadline: U256,
) -> B256 {
    let mut buf = Vec::with_capacity(32 * 6);
    buf.extend_from_slice(keccak256(BATCH_EXECUTE_TYPE).as_slice());
    buf.extend_from_slice(hash_addresses(tos).as_slice());
    buf.extend_from_slice(hash_values(values).as_slice());
    buf.extend_from_slice(hash_payloads(datas).as_slice());
    buf.extend_from_slice(&nonce.to_be_bytes::<32>());
    buf.extend_from_slice(&deadline.to_be_bytes::<32>());
    keccak256(buf)
}

/// Final digest: `keccak256("\x19\x01" || domainSeparator || structHash)`.
pub fn typed_digest(domain_separator: B256, struct_hash: B256) -> B256 {
    let mut buf = Vec::with_capacity(2 + 32 + 32);
    buf.extend_from_slice(b"\x19\x01");
    buf.extend_from_slice(domain_separator.as_slice());
    buf.extend_from_slice(struct_hash.as_slice());
    keccak256(buf)
}

/// The digest a principal signs to authorize a batch on the account bound by `domain_separator`.
pub fn batch_digest<D: AsRef<[u8]>>(
    domain_separator: B256,
    tos: &[Address],
    values: &[U256],
    datas: &[D],
    nonce: U256,
    deadline: U256,
) -> B256 {
    typed_digest(
        domain_separator,
        batch_struct_hash(tos, values, datas, nonce, deadline),
    )
}
