//! Outbound ports (driven side - SPI)

use primitive_types::U256;
use shared_types::AlgoTag;

/// Port: proof-of-work hash of a serialized header.
///
/// Header serialization and the hash functions themselves live outside the
/// engine; this is the one capability the engine needs from them.
pub trait PowHasher: Send + Sync {
    /// Hash `header_bytes` with `algo`, read as a little-endian number.
    ///
    /// `None` when the implementation does not support `algo`.
    fn pow_hash(&self, algo: AlgoTag, header_bytes: &[u8]) -> Option<U256>;
}
