use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrivacyError {
    #[error("tree depth {0} out of range (1..={max})", max = crate::merkle::MAX_DEPTH)]
    InvalidDepth(usize),

    #[error("merkle tree of depth {depth} is full ({capacity} leaves)")]
    TreeFull { depth: usize, capacity: u64 },

    #[error("leaf position {position} outside tree capacity {capacity}")]
    PositionOutOfRange { position: u64, capacity: u64 },
}
