use alloy_primitives::B256;
use blst::min_pk::SecretKey as BlstSecretKey;

use crate::{
    PubKey, constants::DST, errors::BLSError, signature::BLSSignature, traits::Signable,
};

#[derive(Debug, PartialEq, Clone, Default, Eq, Hash)]
pub struct PrivateKey {
    pub inner: B256,
}

impl PrivateKey {
    /// Derive a key from input keying material (at least 32 bytes) per EIP-2333 `KeyGen`.
    pub fn from_ikm(ikm: &[u8]) -> Result<Self, BLSError> {
        let secret_key = BlstSecretKey::key_gen(ikm, &[])
            .map_err(|err| BLSError::Blst(format!("{err:?}")))?;
        Ok(Self {
            inner: B256::from(secret_key.to_bytes()),
        })
    }

    fn to_blst_secret_key(&self) -> Result<BlstSecretKey, BLSError> {
        BlstSecretKey::from_bytes(self.inner.as_slice()).map_err(|_| BLSError::InvalidPrivateKey)
    }

    pub fn public_key(&self) -> Result<PubKey, BLSError> {
        Ok(self.to_blst_secret_key()?.sk_to_pk().into())
    }
}

impl Signable for PrivateKey {
    type Error = BLSError;

    fn sign(&self, message: &[u8]) -> Result<BLSSignature, Self::Error> {
        let signature = self.to_blst_secret_key()?.sign(message, DST, &[]);
        Ok(signature.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Verifiable;

    #[test]
    fn test_sign_and_verify() {
        let private_key = PrivateKey::from_ikm(&[42u8; 32]).unwrap();
        let pubkey = private_key.public_key().unwrap();
        let signature = private_key.sign(b"beacon").unwrap();

        assert!(signature.verify(&pubkey, b"beacon").unwrap());
        assert!(!signature.verify(&pubkey, b"other message").unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_signature() {
        let pubkey = PrivateKey::from_ikm(&[1u8; 32])
            .unwrap()
            .public_key()
            .unwrap();
        let garbage = BLSSignature::from_bytes(&[0xffu8; 96]).unwrap();
        assert_eq!(
            garbage.verify(&pubkey, b"beacon"),
            Err(BLSError::InvalidSignature)
        );
    }

    #[test]
    fn test_short_ikm_is_rejected() {
        assert!(PrivateKey::from_ikm(&[0u8; 8]).is_err());
    }
}
