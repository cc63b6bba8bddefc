#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, U256};
use duo_account::{
    sim::SimHost,
    types::batch_digest,
    utils::crypto::{address_of, sign_digest},
    AccountConfig, DuoAccount,
};
use k256::ecdsa::SigningKey;

pub const CHAIN_ID: u64 = 42_161;
pub const NOW: u64 = 1_700_000_000;
pub const ACCOUNT: Address = Address::repeat_byte(0xAA);
pub const ORIGIN: Address = Address::repeat_byte(0xF0);
pub const STRANGER: Address = Address::repeat_byte(0x99);
pub const TARGET: Address = Address::repeat_byte(0x70);
pub const TOKEN: Address = Address::repeat_byte(0xC0);

pub struct Principal {
    pub key: SigningKey,
    pub address: Address,
}

pub fn principal(seed: u8) -> Principal {
    let key = SigningKey::from_slice(&[seed; 32]).expect("valid scalar");
    let address = address_of(key.verifying_key());
    Principal { key, address }
}

pub struct Fixture {
    pub host: SimHost,
    pub account: DuoAccount,
    pub alice: Principal,
    pub bob: Principal,
    /// Assistant.
    pub carol: Principal,
}

pub fn config(alice: &Principal, bob: &Principal, carol: &Principal) -> AccountConfig {
    AccountConfig {
        address: ACCOUNT,
        owners: [alice.address, bob.address],
        assistant: Some(carol.address),
        origin: Some(ORIGIN),
    }
}

pub fn fixture() -> Fixture {
    let alice = principal(1);
    let bob = principal(2);
    let carol = principal(3);
    let host = SimHost::new(CHAIN_ID, NOW);
    let account = DuoAccount::new(&config(&alice, &bob, &carol), CHAIN_ID).expect("valid owners");
    Fixture {
        host,
        account,
        alice,
        bob,
        carol,
    }
}

impl Fixture {
    /// Sign a `BatchExecute` message for this account on the host's current chain.
    pub fn sign_batch(
        &self,
        who: &Principal,
        tos: &[Address],
        values: &[U256],
        datas: &[Bytes],
        nonce: U256,
        deadline: U256,
    ) -> Bytes {
        let domain = duo_account::types::domain_separator(CHAIN_ID, ACCOUNT);
        let digest = batch_digest(domain, tos, values, datas, nonce, deadline);
        sign_digest(&who.key, digest).expect("signing succeeds")
    }
}

pub fn calldata(bytes: &[u8]) -> Bytes {
    Bytes::copy_from_slice(bytes)
}
