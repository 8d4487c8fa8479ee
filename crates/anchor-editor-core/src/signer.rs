//! Signer references
//!
//! Signers are owned by the surrounding application. The editor only reads
//! them to bind anchors and to derive display colours from list position.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to an external signer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignerId(pub u64);

impl fmt::Display for SignerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the signer has already signed the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerStatus {
    #[default]
    Pending,
    Completed,
}

/// A signer as reported by the signer list collaborator.
///
/// The ordinal position of a signer is its index in the list it came in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signer {
    pub id: SignerId,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub status: SignerStatus,
}

impl Signer {
    pub fn new(id: u64, display_name: impl Into<String>) -> Self {
        Self {
            id: SignerId(id),
            display_name: display_name.into(),
            status: SignerStatus::Pending,
        }
    }
}

/// Position of `id` in `signers`, if present
pub fn ordinal_of(signers: &[Signer], id: SignerId) -> Option<usize> {
    signers.iter().position(|s| s.id == id)
}
