use crate::{PubKey, signature::BLSSignature};

pub trait Verifiable {
    type Error;

    /// Verifies a BLS signature against a public key and message.
    ///
    /// Returns `Ok(true)` if the signature is valid, `Ok(false)` if verification fails, or
    /// `Err` if the signature or public key bytes do not decode to curve points.
    fn verify(&self, pubkey: &PubKey, message: &[u8]) -> Result<bool, Self::Error>;
}

pub trait Signable {
    type Error;

    fn sign(&self, message: &[u8]) -> Result<BLSSignature, Self::Error>;
}
