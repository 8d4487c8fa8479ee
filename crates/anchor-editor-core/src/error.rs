use std::fmt;
use thiserror::Error;

use crate::anchor::AnchorKind;
use crate::draft::DraftKey;
use crate::signer::SignerId;

/// Reasons an anchor is not valid for the committed set
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnchorError {
    #[error("Page {page} is outside the document (1..={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("Anchor has no signer bound")]
    MissingSigner,

    #[error("Rectangle has non-finite coordinates")]
    NonFinite,

    #[error("Rectangle extends outside the page")]
    OutOfBounds,

    #[error("Rectangle is smaller than the minimum anchor size")]
    Degenerate,

    #[error("Unknown anchor kind: {0}")]
    UnknownKind(String),

    #[error("Template field kind '{0}' has no anchor equivalent")]
    UnmappedFieldKind(String),

    #[error("Invalid colour: {0}")]
    InvalidColor(String),
}

/// Failure reported by one of the external collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("Page renderer failed: {0}")]
    PageRenderer(String),

    #[error("Signer list failed: {0}")]
    SignerList(String),

    #[error("Anchor store failed: {0}")]
    AnchorStore(String),
}

/// Where an unbound anchor sits, so the user can find and fix it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnboundAnchor {
    pub key: DraftKey,
    pub page: u32,
    pub kind: AnchorKind,
}

impl fmt::Display for UnboundAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on page {}", self.kind, self.page)
    }
}

fn list_unbound(anchors: &[UnboundAnchor]) -> String {
    anchors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Anchors without a signer: {}", list_unbound(.0))]
    UnboundAnchors(Vec<UnboundAnchor>),

    #[error("Invalid {kind} anchor on page {page}: {reason}")]
    InvalidAnchor {
        key: DraftKey,
        page: u32,
        kind: AnchorKind,
        #[source]
        reason: AnchorError,
    },

    #[error("Add at least one anchor before saving")]
    NothingToSave,

    #[error("Document already has signatures and can no longer be edited")]
    DocumentLocked,

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("Unknown signer: {0}")]
    UnknownSigner(SignerId),

    #[error("Unknown anchor draft: {0}")]
    UnknownDraft(DraftKey),

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("No save is in progress")]
    NoSaveInProgress,

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl SessionError {
    /// Whether the user can fix this by editing the anchors
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            SessionError::UnboundAnchors(_)
                | SessionError::InvalidAnchor { .. }
                | SessionError::NothingToSave
        )
    }
}
