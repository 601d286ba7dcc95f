//! Shared setup for the end-to-end tests: an in-memory ledger, a small RSA
//! key and a fully wired dispenser.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dispenser_core::{Dispenser, MixParams};
use dispenser_crypto::{BigUint, Cipher};
use dispenser_ledger::{ConfirmationPolicy, MockLedger, TransactionSubmitter};
use dispenser_types::Address;
use rand::rngs::OsRng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::RsaPrivateKey;
use tokio::sync::broadcast;

pub const DEPOSIT: u128 = 1_000;

pub struct TestContext {
    pub key: RsaPrivateKey,
    pub ledger: Arc<MockLedger>,
    pub submitter: TransactionSubmitter,
    pub blocks: broadcast::Sender<u64>,
    pub dispenser: Arc<Dispenser>,
}

impl TestContext {
    pub fn new() -> Self {
        let key = RsaPrivateKey::new(&mut OsRng, 512).expect("key generation");
        let cipher = Arc::new(Cipher::from_private_key(&key));
        let ledger = Arc::new(MockLedger::new());
        let submitter = TransactionSubmitter::with_policy(
            ledger.clone(),
            Address::from("0xoperator"),
            ConfirmationPolicy {
                poll_interval: Duration::from_millis(1),
                max_attempts: 5,
            },
        );
        let (blocks, _) = broadcast::channel(64);
        let params = MixParams {
            deposit: DEPOSIT,
            deadline_join: 2,
            deadline_warranty: 2,
            deadline_unblind: 2,
            deadline_distribute: 2,
            ..MixParams::default()
        };
        let dispenser = Arc::new(Dispenser::new(
            cipher,
            submitter.clone(),
            blocks.clone(),
            params,
        ));

        Self {
            key,
            ledger,
            submitter,
            blocks,
            dispenser,
        }
    }
}

/// Client side of the blind signature: hides a token from the signer and
/// recovers the signature afterwards.
pub struct Blinder {
    n: BigUint,
    e: BigUint,
    r: BigUint,
    r_inv: BigUint,
}

impl Blinder {
    /// The inverse of the blinding factor is derived from the key's primes,
    /// which only a test can see.
    pub fn new(key: &RsaPrivateKey, r: u64) -> Self {
        let one = BigUint::from(1u32);
        let primes = key.primes();
        let phi = (&primes[0] - &one) * (&primes[1] - &one);
        let n = key.n().clone();
        let r = BigUint::from(r);
        let r_inv = r.modpow(&(phi - &one), &n);

        Self {
            e: key.e().clone(),
            n,
            r,
            r_inv,
        }
    }

    /// `m * r^e mod n` as hex, where `m` is the UTF-8 token.
    pub fn blind(&self, token: &str) -> String {
        let m = BigUint::from_bytes_be(token.as_bytes());
        ((m * self.r.modpow(&self.e, &self.n)) % &self.n).to_str_radix(16)
    }

    /// `s' * r^-1 mod n`: a plain signature over the token.
    pub fn unblind(&self, blind_signature: &str) -> String {
        let s = BigUint::parse_bytes(blind_signature.as_bytes(), 16).expect("hex signature");
        ((s * &self.r_inv) % &self.n).to_str_radix(16)
    }
}

/// Poll `check` until it holds, or panic after about two seconds.
pub async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..400 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {}", what);
}
