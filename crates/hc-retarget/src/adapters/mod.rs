//! Adapters implementing the outbound ports.

pub mod hashing;

pub use hashing::DigestPowHasher;
