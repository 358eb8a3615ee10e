//! Operator-key signing for queue adverts and mixed-transaction broadcasts.

use crate::foundation::{Hash32, PoolError, Result};
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

/// Signs coordinator announcements with the registered operator key.
pub trait OperatorSigner: Send + Sync {
    fn sign(&self, payload: &Hash32) -> Result<Vec<u8>>;
    fn public_key(&self) -> PublicKey;
}

/// Verify a compact ECDSA signature over a 32-byte payload.
pub fn verify_signature(pubkey: &PublicKey, payload: &Hash32, signature: &[u8]) -> bool {
    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*payload);
    match Signature::from_compact(signature) {
        Ok(sig) => secp.verify_ecdsa(&message, &sig, pubkey).is_ok(),
        Err(_) => false,
    }
}

pub struct Secp256k1Signer {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl Secp256k1Signer {
    pub fn new(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self { secret_key, public_key }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|err| PoolError::OperatorKey(err.to_string()))?;
        Ok(Self::new(secret_key))
    }
}

impl OperatorSigner for Secp256k1Signer {
    fn sign(&self, payload: &Hash32) -> Result<Vec<u8>> {
        let secp = Secp256k1::signing_only();
        let message = Message::from_digest(*payload);
        let signature = secp.sign_ecdsa(&message, &self.secret_key);
        Ok(signature.serialize_compact().to_vec())
    }

    fn public_key(&self) -> PublicKey {
        self.public_key
    }
}
