//! Hashing primitives for regstore.
//!
//! Provides domain-separated BLAKE3 hashing used to derive file registry
//! keys from paths and to fingerprint emitted events.

pub mod hasher;

pub use hasher::ContentHasher;
