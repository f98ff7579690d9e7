use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::{decode_32, TypeError};

/// Identity of a caller as seen by the access guard.
///
/// How an `AccountId` is authenticated is outside regstore: the host hands a
/// registry an already-established identity and the guard only compares it
/// against its administrator set. Ids are 32 bytes and serialize as hex.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId {
    hash: [u8; 32],
}

impl AccountId {
    /// Derive an `AccountId` from a human-readable label.
    ///
    /// The same label always produces the same id. Used by the CLI and tests
    /// to name accounts without managing keys.
    pub fn from_label(label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"regstore-account-v1:label:");
        hasher.update(label.as_bytes());
        Self {
            hash: *hasher.finalize().as_bytes(),
        }
    }

    /// Derive an `AccountId` from a 32-byte public key.
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"regstore-account-v1:pubkey:");
        hasher.update(public_key);
        Self {
            hash: *hasher.finalize().as_bytes(),
        }
    }

    /// Create a random account, handy for "some other caller" in tests.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self { hash: bytes }
    }

    /// Create from raw bytes.
    pub fn from_raw(hash: [u8; 32]) -> Self {
        Self { hash }
    }

    /// Parse from 64 hex characters, with or without the `acct:` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("acct:").unwrap_or(s);
        Ok(Self {
            hash: decode_32(s)?,
        })
    }

    /// Parse a CLI-style reference: hex if it decodes, otherwise a label.
    pub fn parse_or_label(s: &str) -> Self {
        Self::from_hex(s).unwrap_or_else(|_| Self::from_label(s))
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("acct:{}", hex::encode(&self.hash[..4]))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.short_id())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for AccountId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}
