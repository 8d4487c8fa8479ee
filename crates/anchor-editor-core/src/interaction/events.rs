//! Input events consumed by the state machine and the actions it reports

use serde::{Deserialize, Serialize};

use crate::coords::{PixelRect, Point};
use crate::draft::DraftKey;

use super::handles::ResizeHandle;

/// Keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Delete,
    Backspace,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Key::Escape,
            "Delete" | "Del" => Key::Delete,
            "Backspace" => Key::Backspace,
            _ => Key::Other,
        }
    }
}

/// Pointer and keyboard input. Pointer positions are in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    PointerDown { point: Point },
    PointerMove { point: Point },
    PointerUp { point: Point },
    KeyDown { key: Key },
    PageChanged { page: u32 },
}

/// Gesture state of the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    #[default]
    Idle,
    Drawing,
    Selecting,
    Dragging,
    Resizing,
}

/// Observable effect of one event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorAction {
    None,
    /// Input was dropped because the session is locked
    Ignored,
    DrawStarted,
    /// Live preview of the rectangle being drawn, in display pixels
    DrawUpdated { preview: PixelRect },
    DrawDiscarded,
    Created { key: DraftKey },
    Selected { key: DraftKey },
    Deselected,
    DragStarted { key: DraftKey },
    Moved { key: DraftKey },
    ResizeStarted { key: DraftKey, handle: ResizeHandle },
    Resized { key: DraftKey },
    /// A gesture was aborted and its draft restored
    Cancelled,
    Deleted { key: DraftKey },
    PageChanged { page: u32 },
}

impl EditorAction {
    /// Whether the overlay needs to be redrawn
    pub fn needs_render(&self) -> bool {
        !matches!(self, EditorAction::None | EditorAction::Ignored)
    }
}

/// Result of dispatching one event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: InteractionState,
    pub action: EditorAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_dom() {
        assert_eq!(Key::from_dom("Escape"), Key::Escape);
        assert_eq!(Key::from_dom("Delete"), Key::Delete);
        assert_eq!(Key::from_dom("Backspace"), Key::Backspace);
        assert_eq!(Key::from_dom("a"), Key::Other);
    }

    #[test]
    fn test_event_json_shape() {
        let event: EditorEvent =
            serde_json::from_str(r#"{"type":"pointer_down","point":{"x":10.0,"y":20.0}}"#).unwrap();
        assert_eq!(
            event,
            EditorEvent::PointerDown {
                point: Point::new(10.0, 20.0)
            }
        );

        let event: EditorEvent =
            serde_json::from_str(r#"{"type":"key_down","key":"Escape"}"#).unwrap();
        assert_eq!(event, EditorEvent::KeyDown { key: Key::Escape });
    }
}
