use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Public identity of a caller or fee recipient (32 bytes).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(#[serde(with = "hex::serde")] pub [u8; 32]);

impl AccountId {
    /// Derive an id from arbitrary key material.
    pub fn derive(material: &[u8]) -> Self {
        Self(*blake3::hash(material).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).context("account id is not valid hex")?;
        ensure!(
            bytes.len() == 32,
            "account id must be 32 bytes, got {}",
            bytes.len()
        );

        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", hex::encode(&self.0[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let id = AccountId::derive(b"alice");
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        let prefixed: AccountId = format!("0x{}", id).parse().unwrap();
        assert_eq!(prefixed, id);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("zz".parse::<AccountId>().is_err());
        assert!("abcd".parse::<AccountId>().is_err());
    }
}
