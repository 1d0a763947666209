use crate::geometry::Point;
use crate::scene::PlacementId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// What a drag does to the placement it started on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Translate,
    /// Point the image at the pointer, pivoting on its center.
    Rotate,
}

/// How pointer buttons map to gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Every drag moves the image.
    TranslateOnly,
    /// Primary drags move, secondary drags rotate.
    #[default]
    SecondaryRotates,
}

impl InteractionMode {
    pub fn gesture_for(&self, button: PointerButton) -> Option<Gesture> {
        match (self, button) {
            (_, PointerButton::Middle) => None,
            (InteractionMode::TranslateOnly, _) => Some(Gesture::Translate),
            (InteractionMode::SecondaryRotates, PointerButton::Primary) => Some(Gesture::Translate),
            (InteractionMode::SecondaryRotates, PointerButton::Secondary) => Some(Gesture::Rotate),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        target: PlacementId,
        gesture: Gesture,
        /// Pointer position at the previous event, in screen space.
        last: Point,
    },
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    pub fn target(&self) -> Option<PlacementId> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { target, .. } => Some(*target),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_secondary_rotates() {
        let mode = InteractionMode::SecondaryRotates;
        assert_eq!(Some(Gesture::Translate), mode.gesture_for(PointerButton::Primary));
        assert_eq!(Some(Gesture::Rotate), mode.gesture_for(PointerButton::Secondary));
        assert_eq!(None, mode.gesture_for(PointerButton::Middle));
    }

    #[test]
    fn test_translate_only() {
        let mode = InteractionMode::TranslateOnly;
        assert_eq!(Some(Gesture::Translate), mode.gesture_for(PointerButton::Primary));
        assert_eq!(Some(Gesture::Translate), mode.gesture_for(PointerButton::Secondary));
    }

    #[test]
    fn test_mode_names() {
        let mode: InteractionMode = serde_json::from_str(r#""translate_only""#).unwrap();
        assert_eq!(InteractionMode::TranslateOnly, mode);
        assert_eq!(
            r#""secondary_rotates""#,
            serde_json::to_string(&InteractionMode::default()).unwrap()
        );
    }

    #[test]
    fn test_idle_has_no_target() {
        assert!(!DragState::Idle.is_dragging());
        assert_eq!(None, DragState::default().target());
    }
}
