use std::{cmp::Ordering, str::FromStr};

use alloy_primitives::hex;
use blst::min_pk::PublicKey as BlstPublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz_derive::{Decode, Encode};
use ssz_types::{FixedVector, typenum::U48};
use tree_hash_derive::TreeHash;

use crate::{constants::PUBKEY_BYTES_LEN, errors::BLSError};

#[derive(Debug, PartialEq, Clone, Encode, Decode, TreeHash, Default, Eq, Hash)]
pub struct PubKey {
    pub inner: FixedVector<u8, U48>,
}

impl PubKey {
    pub fn to_bytes(&self) -> &[u8] {
        self.inner.iter().as_slice()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BLSError> {
        if bytes.len() != PUBKEY_BYTES_LEN {
            return Err(BLSError::InvalidByteLength {
                expected: PUBKEY_BYTES_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            inner: FixedVector::from(bytes.to_vec()),
        })
    }

    pub fn to_blst_pubkey(&self) -> Result<BlstPublicKey, BLSError> {
        BlstPublicKey::key_validate(self.to_bytes()).map_err(|_| BLSError::InvalidPublicKey)
    }
}

impl From<BlstPublicKey> for PubKey {
    fn from(value: BlstPublicKey) -> Self {
        Self {
            inner: FixedVector::from(value.to_bytes().to_vec()),
        }
    }
}

/// Byte-wise ordering, used wherever validators are sorted by key.
impl Ord for PubKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(other.to_bytes())
    }
}

impl PartialOrd for PubKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for PubKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.to_bytes())))
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let result: String = Deserialize::deserialize(deserializer)?;
        PubKey::from_str(&result).map_err(serde::de::Error::custom)
    }
}

impl FromStr for PubKey {
    type Err = BLSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let clean_str = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(clean_str).map_err(|_| BLSError::InvalidHexString)?;
        PubKey::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubkey_ordering_is_bytewise() {
        let mut low = [0u8; 48];
        low[47] = 1;
        let mut high = [0u8; 48];
        high[0] = 1;

        let low = PubKey::from_bytes(&low).unwrap();
        let high = PubKey::from_bytes(&high).unwrap();
        assert!(low < high);
    }

    #[test]
    fn test_pubkey_rejects_wrong_length() {
        assert_eq!(
            PubKey::from_str("0x1234"),
            Err(BLSError::InvalidByteLength {
                expected: 48,
                actual: 2
            })
        );
    }

    #[test]
    fn test_pubkey_serde_hex() {
        let pubkey = PubKey::from_bytes(&[7u8; 48]).unwrap();
        let json = serde_json::to_string(&pubkey).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "07".repeat(48)));
        assert_eq!(serde_json::from_str::<PubKey>(&json).unwrap(), pubkey);
    }
}
