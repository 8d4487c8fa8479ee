//! Boundary traits for the services the editor depends on
//!
//! The editor never renders PDF content, never owns signer records and never
//! talks to storage. Each of those is reached through one of the traits
//! below so the host application can plug in its own transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::anchor::{Anchor, AnchorId};
use crate::coords::PageSize;
use crate::error::CollaboratorError;
use crate::signer::Signer;

/// Opaque reference to a stored document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the page renderer reports once per load
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_count: u32,
    /// Logical canvas size shared by every page of the document
    pub page_size: PageSize,
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn page_layout(&self, document: &DocumentId) -> Result<PageLayout, CollaboratorError>;
}

#[async_trait]
pub trait SignerDirectory: Send + Sync {
    /// Signers in display order. Position in this list drives colour.
    async fn signers(&self, document: &DocumentId) -> Result<Vec<Signer>, CollaboratorError>;
}

#[async_trait]
pub trait AnchorStore: Send + Sync {
    async fn load_anchors(&self, document: &DocumentId) -> Result<Vec<Anchor>, CollaboratorError>;

    /// Replace the full anchor set of a document. Returns the stored set in
    /// the order it was given, with the ids the store assigned.
    async fn save_anchors(
        &self,
        document: &DocumentId,
        anchors: Vec<Anchor>,
    ) -> Result<Vec<Anchor>, CollaboratorError>;
}

/// Single-document backend kept in memory. Implements every collaborator
/// trait; useful for hosts without a server and for tests.
#[derive(Debug)]
pub struct MemoryBackend {
    layout: PageLayout,
    signers: Vec<Signer>,
    anchors: Mutex<HashMap<DocumentId, Vec<Anchor>>>,
    next_id: Mutex<u64>,
    fail_saves: AtomicBool,
}

impl MemoryBackend {
    pub fn new(layout: PageLayout, signers: Vec<Signer>) -> Self {
        Self {
            layout,
            signers,
            anchors: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Seed the stored anchors of a document
    pub fn with_anchors(self, document: &DocumentId, anchors: Vec<Anchor>) -> Self {
        if let Ok(mut map) = self.anchors.lock() {
            map.insert(document.clone(), anchors);
        }
        self
    }

    /// Make every following save fail until switched off again
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Anchors currently stored for a document
    pub fn stored(&self, document: &DocumentId) -> Vec<Anchor> {
        self.anchors
            .lock()
            .map(|map| map.get(document).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

fn poisoned(_: impl fmt::Debug) -> CollaboratorError {
    CollaboratorError::AnchorStore("store lock poisoned".to_string())
}

#[async_trait]
impl PageRenderer for MemoryBackend {
    async fn page_layout(&self, _document: &DocumentId) -> Result<PageLayout, CollaboratorError> {
        Ok(self.layout)
    }
}

#[async_trait]
impl SignerDirectory for MemoryBackend {
    async fn signers(&self, _document: &DocumentId) -> Result<Vec<Signer>, CollaboratorError> {
        Ok(self.signers.clone())
    }
}

#[async_trait]
impl AnchorStore for MemoryBackend {
    async fn load_anchors(&self, document: &DocumentId) -> Result<Vec<Anchor>, CollaboratorError> {
        let map = self.anchors.lock().map_err(poisoned)?;
        Ok(map.get(document).cloned().unwrap_or_default())
    }

    async fn save_anchors(
        &self,
        document: &DocumentId,
        mut anchors: Vec<Anchor>,
    ) -> Result<Vec<Anchor>, CollaboratorError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CollaboratorError::AnchorStore(format!(
                "save rejected for document {}",
                document
            )));
        }

        let mut next_id = self.next_id.lock().map_err(poisoned)?;
        for anchor in &mut anchors {
            if anchor.id.is_none() {
                anchor.id = Some(AnchorId(*next_id));
                *next_id += 1;
            }
        }

        let mut map = self.anchors.lock().map_err(poisoned)?;
        map.insert(document.clone(), anchors.clone());
        Ok(anchors)
    }
}
