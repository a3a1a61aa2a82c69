//! Callbacks into the editor surface.
//!
//! The engine never draws. It tells a [`LinkFeedback`] when connection
//! highlights appear or disappear and a [`SelectionRenderer`] when the
//! selection changed.

use crate::drawing::{CellId, ObjectId};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Editor interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EditMode {
    #[default]
    Default,
    Stamp,
    Text,
    Drag,
    /// Hovering a connection target.
    LinkConnect,
    /// Hovering a polyline end that would join.
    LinkJoin,
    Wall,
}

/// A connect or join highlight being shown or hidden.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub target: ObjectId,
    pub point: Point,
    pub show: bool,
    pub join: bool,
    pub drag_id: ObjectId,
    pub inside: Option<CellId>,
}

/// Highlight and edit-mode sink used while dragging.
pub trait LinkFeedback {
    fn edit_mode(&self) -> EditMode;

    /// Enter `mode`, remembering the current one.
    fn set_edit_mode(&mut self, mode: EditMode);

    /// Return to the mode active before the last [`set_edit_mode`](Self::set_edit_mode).
    fn undo_edit_mode(&mut self);

    fn hilite_connect(&mut self, highlight: &Highlight);

    fn move_connect_highlight(&mut self, target: ObjectId, point: Point, inside: Option<CellId>);
}

/// Notified after the selection changes.
pub trait SelectionRenderer {
    fn hide_all_selection_states(&mut self);
    fn render_all_selection_states(&mut self);
}

/// Stack of edit modes; the bottom is always [`EditMode::Default`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditModeStack {
    stack: Vec<EditMode>,
}

impl EditModeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> EditMode {
        self.stack.last().copied().unwrap_or_default()
    }

    pub fn push(&mut self, mode: EditMode) {
        self.stack.push(mode);
    }

    pub fn pop(&mut self) -> Option<EditMode> {
        self.stack.pop()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Feedback sink that only tracks edit modes.
#[derive(Debug, Clone, Default)]
pub struct NoFeedback {
    modes: EditModeStack,
}

impl LinkFeedback for NoFeedback {
    fn edit_mode(&self) -> EditMode {
        self.modes.current()
    }

    fn set_edit_mode(&mut self, mode: EditMode) {
        self.modes.push(mode);
    }

    fn undo_edit_mode(&mut self) {
        self.modes.pop();
    }

    fn hilite_connect(&mut self, _highlight: &Highlight) {}

    fn move_connect_highlight(&mut self, _target: ObjectId, _point: Point, _inside: Option<CellId>) {}
}

/// Renderer that ignores notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRender;

impl SelectionRenderer for NoRender {
    fn hide_all_selection_states(&mut self) {}
    fn render_all_selection_states(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_stack() {
        let mut modes = EditModeStack::new();
        assert_eq!(modes.current(), EditMode::Default);
        modes.push(EditMode::LinkConnect);
        modes.push(EditMode::LinkJoin);
        assert_eq!(modes.current(), EditMode::LinkJoin);
        modes.pop();
        assert_eq!(modes.current(), EditMode::LinkConnect);
        modes.pop();
        assert_eq!(modes.pop(), None);
        assert_eq!(modes.current(), EditMode::Default);
    }

    #[test]
    fn test_no_feedback_tracks_modes() {
        let mut fb = NoFeedback::default();
        fb.set_edit_mode(EditMode::Drag);
        assert_eq!(fb.edit_mode(), EditMode::Drag);
        fb.undo_edit_mode();
        assert_eq!(fb.edit_mode(), EditMode::Default);
    }
}
