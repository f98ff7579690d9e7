use std::fmt;

use serde::{Deserialize, Serialize};

/// The two record registries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegistryKind {
    Posts,
    Files,
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posts => write!(f, "posts"),
            Self::Files => write!(f, "files"),
        }
    }
}
