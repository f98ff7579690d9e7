use regstore_types::FileKey;

/// Domain-separated BLAKE3 hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a path and an event with identical bytes never produce
/// the same digest.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for file paths (file registry keys).
    pub const PATH: Self = Self {
        domain: "regstore-path-v1",
    };
    /// Hasher for emitted registry events.
    pub const EVENT: Self = Self {
        domain: "regstore-event-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Derive the file registry key for a path.
    ///
    /// The path is hashed exactly as given (UTF-8 bytes, no normalization),
    /// so `a/b` and `./a/b` are different files.
    pub fn hash_path(&self, path: &str) -> FileKey {
        FileKey::from_hash(self.hash(path.as_bytes()))
    }

    /// Verify that data produces the expected digest.
    pub fn verify(&self, data: &[u8], expected: &[u8; 32]) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
