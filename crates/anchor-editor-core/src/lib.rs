//! Anchor editing engine for signature placement
//!
//! This crate places signature and initials anchors on document pages and
//! keeps them as page-relative, zoom-independent rectangles bound to signers.
//!
//! - `coords`: screen, canvas and normalized coordinate conversions
//! - `anchor`: persisted anchor records, clamping and validation
//! - `interaction`: draw / select / drag / resize state machine
//! - `session`: load and save through the collaborator traits
//!
//! The crate does not render PDFs and does not talk to storage directly;
//! see [`collaborators`] for the boundary.

pub mod anchor;
pub mod collaborators;
pub mod config;
pub mod coords;
pub mod draft;
pub mod error;
pub mod interaction;
pub mod palette;
pub mod session;
pub mod signer;
pub mod text_height;

pub use anchor::{Anchor, AnchorId, AnchorKind, PageGeometry, TemplateFieldKind};
pub use collaborators::{
    AnchorStore, DocumentId, MemoryBackend, PageLayout, PageRenderer, SignerDirectory,
};
pub use config::{EditorConfig, ZoomConfig};
pub use coords::{NormalizedRect, PageSize, PixelRect, Point};
pub use draft::{AnchorDraft, DraftKey, DraftView};
pub use error::{AnchorError, CollaboratorError, SessionError, UnboundAnchor};
pub use interaction::{
    EditorAction, EditorEvent, HitTarget, InteractionMachine, InteractionState, Key, ResizeHandle,
    ToolMode, Transition,
};
pub use palette::{Color, SignerPalette};
pub use session::EditorSession;
pub use signer::{Signer, SignerId, SignerStatus};
pub use text_height::OverflowCheck;
