mod common;

use alloy_primitives::{Address, Bytes, U256};
use common::{calldata, fixture, principal, Fixture, ACCOUNT, CHAIN_ID, NOW};
use duo_account::{
    types::{batch_digest, batch_fingerprint, domain_separator},
    utils::crypto::sign_digest,
    AccountError, Execution, SignedBatch,
};

const FIRST: Address = Address::repeat_byte(0x71);
const SECOND: Address = Address::repeat_byte(0x72);

struct Batch {
    tos: Vec<Address>,
    values: Vec<U256>,
    datas: Vec<Bytes>,
    nonce: U256,
    deadline: U256,
}

fn batch() -> Batch {
    Batch {
        tos: vec![FIRST, SECOND],
        values: vec![U256::from(3u64), U256::ZERO],
        datas: vec![calldata(b"first"), calldata(b"second")],
        nonce: U256::from(11u64),
        deadline: U256::from(NOW + 600),
    }
}

impl Batch {
    fn signed<'a>(&'a self, signature: &'a [u8]) -> SignedBatch<'a> {
        SignedBatch {
            tos: &self.tos,
            values: &self.values,
            datas: &self.datas,
            nonce: self.nonce,
            deadline: self.deadline,
            signature,
        }
    }

    fn signature(&self, fx: &Fixture, who: &common::Principal) -> Bytes {
        fx.sign_batch(who, &self.tos, &self.values, &self.datas, self.nonce, self.deadline)
    }
}

/// `n - s` with the parity flipped: the same signature in its high-s form.
fn malleate(signature: &[u8]) -> Bytes {
    let order: U256 = "0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141"
        .parse()
        .expect("curve order");
    let s = U256::from_be_slice(&signature[32..64]);
    let high = order - s;
    let mut out = signature.to_vec();
    out[32..64].copy_from_slice(&high.to_be_bytes::<32>());
    out[64] = if out[64] == 27 { 28 } else { 27 };
    Bytes::from(out)
}

#[test]
fn two_signatures_execute_the_batch() -> eyre::Result<()> {
    let mut fx = fixture();
    fx.host.fund(ACCOUNT, U256::from(3u64));
    let b = batch();
    let by_alice = b.signature(&fx, &fx.alice);
    let by_bob = b.signature(&fx, &fx.bob);

    let first = fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&by_alice))?;
    assert!(first.is_proposed());
    assert!(fx.host.calls().is_empty());

    let second = fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&by_bob))?;
    let Execution::Executed { fingerprint, outputs } = second else {
        eyre::bail!("expected execution");
    };
    assert_eq!(fingerprint, batch_fingerprint(&b.tos, &b.values, &b.datas, b.nonce));
    assert_eq!(outputs.len(), 2);
    assert_eq!(fx.host.balance(FIRST), U256::from(3u64));
    assert_eq!(fx.account.pending_count(), 0);
    Ok(())
}

#[test]
fn signatures_cannot_be_replayed() -> eyre::Result<()> {
    let mut fx = fixture();
    fx.host.fund(ACCOUNT, U256::from(3u64));
    let b = batch();
    let by_alice = b.signature(&fx, &fx.alice);
    let by_carol = b.signature(&fx, &fx.carol);

    fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&by_alice))?;
    // Replaying the proposal does not count as a confirmation.
    assert_eq!(
        fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&by_alice)),
        Err(AccountError::Signed)
    );

    fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&by_carol))?;
    assert_eq!(fx.host.calls().len(), 2);

    // Neither signature can start a new cycle of the same batch.
    assert_eq!(
        fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&by_carol)),
        Err(AccountError::Signed)
    );
    assert_eq!(
        fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&by_alice)),
        Err(AccountError::Signed)
    );
    assert_eq!(fx.account.pending_count(), 0);
    assert_eq!(fx.host.calls().len(), 2);
    Ok(())
}

#[test]
fn expired_signature_changes_nothing() {
    let mut fx = fixture();
    let b = batch();
    let by_alice = b.signature(&fx, &fx.alice);
    fx.host.set_timestamp(NOW + 601);

    let events = fx.account.events().len();
    assert_eq!(
        fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&by_alice)),
        Err(AccountError::Expired)
    );
    assert_eq!(fx.account.pending_count(), 0);
    assert_eq!(fx.account.events().len(), events);
}

#[test]
fn deadline_itself_is_still_valid() -> eyre::Result<()> {
    let mut fx = fixture();
    let b = batch();
    let by_alice = b.signature(&fx, &fx.alice);
    fx.host.set_timestamp(NOW + 600);
    assert!(fx
        .account
        .batch_execute_with_sig(&mut fx.host, &b.signed(&by_alice))?
        .is_proposed());
    Ok(())
}

#[test]
fn high_s_signature_is_rejected() {
    let mut fx = fixture();
    let b = batch();
    let by_alice = b.signature(&fx, &fx.alice);
    let flipped = malleate(&by_alice);

    assert_eq!(
        fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&flipped)),
        Err(AccountError::BadSign)
    );
    assert_eq!(fx.account.pending_count(), 0);
}

#[test]
fn truncated_signature_is_rejected() {
    let mut fx = fixture();
    let b = batch();
    let by_alice = b.signature(&fx, &fx.alice);
    assert_eq!(
        fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&by_alice[..64])),
        Err(AccountError::BadSign)
    );
}

#[test]
fn mismatched_lengths_are_rejected_before_recovery() {
    let mut fx = fixture();
    let mut b = batch();
    b.values.pop();
    assert_eq!(
        fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&[0u8; 65])),
        Err(AccountError::WrongLen)
    );
}

#[test]
fn outsider_signature_is_rejected() {
    let mut fx = fixture();
    let b = batch();
    let mallory = principal(9);
    let by_mallory = b.signature(&fx, &mallory);
    assert_eq!(
        fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&by_mallory)),
        Err(AccountError::NotOwner)
    );
    assert!(!fx.account.is_consumed(
        mallory.address,
        batch_digest(
            domain_separator(CHAIN_ID, ACCOUNT),
            &b.tos,
            &b.values,
            &b.datas,
            b.nonce,
            b.deadline
        )
    ));
}

#[test]
fn live_and_signed_authorizations_combine() -> eyre::Result<()> {
    let mut fx = fixture();
    fx.host.fund(ACCOUNT, U256::from(3u64));
    let b = batch();

    let live = fx.account.batch_execute(
        &mut fx.host,
        fx.alice.address,
        &b.tos,
        &b.values,
        &b.datas,
        b.nonce,
    )?;
    assert!(live.is_proposed());

    let by_bob = b.signature(&fx, &fx.bob);
    let signed = fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&by_bob))?;
    assert!(!signed.is_proposed());
    assert_eq!(fx.host.calls().len(), 2);
    Ok(())
}

#[test]
fn signer_cannot_confirm_itself_with_a_second_signature() -> eyre::Result<()> {
    let mut fx = fixture();
    let b = batch();
    let by_alice = b.signature(&fx, &fx.alice);
    fx.account.batch_execute_with_sig(&mut fx.host, &b.signed(&by_alice))?;

    // Different deadline: new digest, same fingerprint.
    let mut later = batch();
    later.deadline = U256::from(NOW + 1200);
    let again = later.signature(&fx, &fx.alice);
    assert_eq!(
        fx.account.batch_execute_with_sig(&mut fx.host, &later.signed(&again)),
        Err(AccountError::AlreadyApproved)
    );

    // The failed attempt did not burn the second signature.
    let digest = batch_digest(
        domain_separator(CHAIN_ID, ACCOUNT),
        &later.tos,
        &later.values,
        &later.datas,
        later.nonce,
        later.deadline,
    );
    assert!(!fx.account.is_consumed(fx.alice.address, digest));
    Ok(())
}

#[test]
fn chain_split_invalidates_old_domain() -> eyre::Result<()> {
    let mut fx = fixture();
    let b = batch();
    let stale = b.signature(&fx, &fx.alice);

    let forked = CHAIN_ID + 1;
    fx.host.set_chain_id(forked);
    assert!(fx
        .account
        .batch_execute_with_sig(&mut fx.host, &b.signed(&stale))
        .is_err());
    assert_eq!(fx.account.pending_count(), 0);

    let domain = domain_separator(forked, ACCOUNT);
    assert_eq!(fx.account.domain_separator(forked), domain);
    let digest = batch_digest(domain, &b.tos, &b.values, &b.datas, b.nonce, b.deadline);
    let fresh = sign_digest(&fx.alice.key, digest).map_err(|e| eyre::eyre!("signing failed: {e}"))?;
    assert!(fx
        .account
        .batch_execute_with_sig(&mut fx.host, &b.signed(&fresh))?
        .is_proposed());
    Ok(())
}
