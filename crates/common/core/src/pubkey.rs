use std::{fmt, str::FromStr};

use alloy_primitives::{FixedBytes, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{constants::PUBKEY_LENGTH, errors::CoreError};

/// A validator's BLS public key, used as the key of every per-duty set.
///
/// Serialized as a `0x`-prefixed hex string so it can key JSON objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PubKey {
    pub inner: FixedBytes<PUBKEY_LENGTH>,
}

impl PubKey {
    pub fn new(bytes: [u8; PUBKEY_LENGTH]) -> Self {
        Self {
            inner: FixedBytes::from(bytes),
        }
    }
}

impl fmt::Display for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.inner))
    }
}

impl FromStr for PubKey {
    type Err = CoreError;

    fn from_str(key_str: &str) -> Result<Self, Self::Err> {
        let clean_str = key_str.strip_prefix("0x").unwrap_or(key_str);
        let bytes = hex::decode(clean_str).map_err(|_| CoreError::InvalidHexString)?;

        let bytes: [u8; PUBKEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|bytes: Vec<u8>| CoreError::InvalidByteLength {
                    expected: PUBKEY_LENGTH,
                    actual: bytes.len(),
                })?;

        Ok(Self::new(bytes))
    }
}

impl Serialize for PubKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let result: String = Deserialize::deserialize(deserializer)?;
        result.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_pubkey_from_str() {
        let key = PubKey::new([0xab; PUBKEY_LENGTH]);
        let parsed: PubKey = key.to_string().parse().expect("valid pubkey");
        assert_eq!(parsed, key);

        let without_prefix = key.to_string().trim_start_matches("0x").to_string();
        assert_eq!(without_prefix.parse::<PubKey>().expect("valid pubkey"), key);

        assert!(matches!(
            "0xabcd".parse::<PubKey>(),
            Err(CoreError::InvalidByteLength { actual: 2, .. })
        ));
        assert!(matches!(
            "0xzz".parse::<PubKey>(),
            Err(CoreError::InvalidHexString)
        ));
    }

    #[test]
    fn test_pubkey_as_json_map_key() {
        let mut map = HashMap::new();
        map.insert(PubKey::new([1; PUBKEY_LENGTH]), 7u64);

        let json = serde_json::to_string(&map).expect("serialize map");
        let decoded: HashMap<PubKey, u64> = serde_json::from_str(&json).expect("deserialize map");

        assert_eq!(decoded, map);
    }
}
