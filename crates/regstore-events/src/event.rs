use std::fmt;

use regstore_crypto::ContentHasher;
use regstore_types::{FileKey, FilePayload, PostId, PostPayload, RegistryKind, Timestamp};
use serde::{Deserialize, Serialize};

/// Content-derived identifier of a registry event.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId {
    hash: [u8; 32],
}

impl EventId {
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self { hash }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Short hex representation (first 8 hex chars).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.hash[..4])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.short_hex())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt:{}", self.short_hex())
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for EventId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let bytes = hex::decode(&value).map_err(|e| format!("invalid event id: {e}"))?;
        let hash: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| format!("invalid event id length: {}", b.len()))?;
        Ok(Self { hash })
    }
}

/// Classification of registry events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    PostCreated,
    PostUpdated,
    PostDeleted,
    FileCreated,
    FileUpdated,
    FileDeleted,
}

impl EventKind {
    /// The registry that emits this kind of event.
    pub fn registry(&self) -> RegistryKind {
        match self {
            Self::PostCreated | Self::PostUpdated | Self::PostDeleted => RegistryKind::Posts,
            Self::FileCreated | Self::FileUpdated | Self::FileDeleted => RegistryKind::Files,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PostCreated => "PostCreated",
            Self::PostUpdated => "PostUpdated",
            Self::PostDeleted => "PostDeleted",
            Self::FileCreated => "FileCreated",
            Self::FileUpdated => "FileUpdated",
            Self::FileDeleted => "FileDeleted",
        };
        write!(f, "{s}")
    }
}

/// The record an event is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKey {
    Post(PostId),
    File(FileKey),
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post(id) => write!(f, "post#{id}"),
            Self::File(key) => write!(f, "file:{}", key.short_hex()),
        }
    }
}

/// Fields carried by an event.
///
/// Creates and updates carry the full new payload; deletes carry nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    Post(PostPayload),
    File(FilePayload),
    Removed,
}

/// A single registry mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEvent {
    /// BLAKE3 digest over every other field.
    pub id: EventId,
    /// Position in the emitting registry's event stream, starting at 1.
    pub seq: u64,
    pub kind: EventKind,
    pub key: EventKey,
    /// Host time of the mutation; equals the record's `updated_at`.
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl RegistryEvent {
    /// Build an event, computing its id.
    pub fn new(
        seq: u64,
        kind: EventKind,
        key: EventKey,
        timestamp: Timestamp,
        payload: EventPayload,
    ) -> Self {
        let preimage = Self::id_preimage(seq, &kind, &key, timestamp, &payload);
        let id = EventId::from_hash(ContentHasher::EVENT.hash(&preimage));
        Self {
            id,
            seq,
            kind,
            key,
            timestamp,
            payload,
        }
    }

    pub fn registry(&self) -> RegistryKind {
        self.kind.registry()
    }

    /// Returns `true` if the id matches the event's content.
    pub fn verify(&self) -> bool {
        let preimage =
            Self::id_preimage(self.seq, &self.kind, &self.key, self.timestamp, &self.payload);
        ContentHasher::EVENT.verify(&preimage, &self.id.hash)
    }

    /// Bytes the id is computed over: seq and timestamp little-endian, then
    /// kind, key and payload in bincode.
    fn id_preimage(
        seq: u64,
        kind: &EventKind,
        key: &EventKey,
        timestamp: Timestamp,
        payload: &EventPayload,
    ) -> Vec<u8> {
        let mut data = Vec::with_capacity(128);
        data.extend_from_slice(&seq.to_le_bytes());
        data.extend_from_slice(&timestamp.as_secs().to_le_bytes());

        if let Ok(kind_bytes) = bincode::serialize(kind) {
            data.extend_from_slice(&kind_bytes);
        }
        if let Ok(key_bytes) = bincode::serialize(key) {
            data.extend_from_slice(&key_bytes);
        }
        if let Ok(payload_bytes) = bincode::serialize(payload) {
            data.extend_from_slice(&payload_bytes);
        }
        data
    }
}
