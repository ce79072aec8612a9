//! Pool events
//!
//! Events are the only channel through which wallets learn about new notes:
//! coordinates of every appended commitment, the ciphertexts and the scanning
//! hints. Byte fields serialize as hex for indexers.

use serde::{Deserialize, Serialize};
use shade_privacy::{Commitment, Nullifier};

use crate::account::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolEvent {
    CommitmentAppended {
        subtree_index: u64,
        commitment: Commitment,
        leaf_index: u64,
        timestamp: u64,
    },
    NullifierSpent {
        nullifier: Nullifier,
    },
    Minted {
        minter: AccountId,
        commitment: Commitment,
        #[serde(with = "hex::serde")]
        encrypted_note: Vec<u8>,
        subtree_index: u64,
        leaf_index: u64,
        timestamp: u64,
    },
    Transaction {
        new_commitments: [Commitment; 2],
        #[serde(with = "hex_list")]
        encrypted_notes: Vec<Vec<u8>>,
        #[serde(with = "hex_keys")]
        ephemeral_keys: [[u8; 32]; 2],
        view_tag: u8,
    },
    FeesDistributed {
        primary: AccountId,
        primary_amount: u128,
        secondary: AccountId,
        secondary_amount: u128,
    },
}

impl PoolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::CommitmentAppended { .. } => "CommitmentAppended",
            PoolEvent::NullifierSpent { .. } => "NullifierSpent",
            PoolEvent::Minted { .. } => "Minted",
            PoolEvent::Transaction { .. } => "Transaction",
            PoolEvent::FeesDistributed { .. } => "FeesDistributed",
        }
    }
}

/// Hex encoding for a list of ciphertexts.
mod hex_list {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(items.iter().map(hex::encode))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| hex::decode(s).map_err(D::Error::custom))
            .collect()
    }
}

/// Hex encoding for the pair of ephemeral public keys.
mod hex_keys {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        keys: &[[u8; 32]; 2],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(keys.iter().map(hex::encode))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[[u8; 32]; 2], D::Error> {
        let [a, b] = <[String; 2]>::deserialize(deserializer)?;
        let mut out = [[0u8; 32]; 2];
        hex::decode_to_slice(a, &mut out[0]).map_err(D::Error::custom)?;
        hex::decode_to_slice(b, &mut out[1]).map_err(D::Error::custom)?;
        Ok(out)
    }
}
