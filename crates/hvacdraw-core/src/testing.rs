//! Fixtures shared by unit tests.

use crate::document::Document;
use crate::drawing::{CellId, DrawingObject, HookPointId, ObjectId};
use crate::feedback::{EditMode, EditModeStack, Highlight, LinkFeedback, SelectionRenderer};
use crate::flags::LayerFlags;
use crate::layers::{Layer, LayersManager};
use kurbo::{Point, Rect};

/// A 40x40 shape with its top-left corner at `(x, y)`.
pub fn shape_at(x: f64, y: f64) -> DrawingObject {
    DrawingObject::shape(Rect::new(x, y, x + 40.0, y + 40.0))
}

/// Three shapes where A hooks to B and B hooks to C. Returns `[a, b, c]`.
pub fn chain_document() -> (Document, [ObjectId; 3]) {
    let mut doc = Document::new();
    let a = doc.add_object(shape_at(0.0, 0.0));
    let b = doc.add_object(shape_at(100.0, 0.0));
    let c = doc.add_object(shape_at(200.0, 0.0));
    assert!(doc.update_hook(a, None, b, HookPointId::KRC, Point::new(0.0, 15000.0), None));
    assert!(doc.update_hook(b, None, c, HookPointId::KRC, Point::new(0.0, 15000.0), None));
    (doc, [a, b, c])
}

/// `L0 {visible: [five, six]}` above `L1 {visible, active: [seven]}`, with L0 active.
pub fn two_layer_document() -> (Document, [ObjectId; 3]) {
    let mut doc = Document::new();
    let five = doc.add_object(shape_at(0.0, 0.0));
    let six = doc.add_object(shape_at(50.0, 0.0));
    let seven = doc.add_object(shape_at(100.0, 0.0));

    let mut l0 = Layer::new("L0", LayerFlags::VISIBLE);
    l0.z_list = vec![five, six];
    let mut l1 = Layer::new("L1", LayerFlags::VISIBLE | LayerFlags::ACTIVE);
    l1.z_list = vec![seven];
    let layers = LayersManager::from_layers(vec![l0, l1], 0, doc.config().max_layers)
        .expect("two layers fit");
    (doc.with_layers(layers), [five, six, seven])
}

/// Counts selection render notifications.
#[derive(Debug, Default)]
pub struct RenderCounter {
    pub hidden: usize,
    pub rendered: usize,
}

impl SelectionRenderer for RenderCounter {
    fn hide_all_selection_states(&mut self) {
        self.hidden += 1;
    }

    fn render_all_selection_states(&mut self) {
        self.rendered += 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackEvent {
    Show { target: ObjectId, join: bool },
    Hide { target: ObjectId, join: bool },
    Move { target: ObjectId, point: Point, inside: Option<CellId> },
}

/// Records every highlight call and tracks edit modes.
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    pub modes: EditModeStack,
    pub events: Vec<FeedbackEvent>,
}

impl RecordingFeedback {
    pub fn shown(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, FeedbackEvent::Show { .. }))
            .count()
    }

    pub fn hidden(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, FeedbackEvent::Hide { .. }))
            .count()
    }
}

impl LinkFeedback for RecordingFeedback {
    fn edit_mode(&self) -> EditMode {
        self.modes.current()
    }

    fn set_edit_mode(&mut self, mode: EditMode) {
        self.modes.push(mode);
    }

    fn undo_edit_mode(&mut self) {
        self.modes.pop();
    }

    fn hilite_connect(&mut self, highlight: &Highlight) {
        let event = if highlight.show {
            FeedbackEvent::Show {
                target: highlight.target,
                join: highlight.join,
            }
        } else {
            FeedbackEvent::Hide {
                target: highlight.target,
                join: highlight.join,
            }
        };
        self.events.push(event);
    }

    fn move_connect_highlight(&mut self, target: ObjectId, point: Point, inside: Option<CellId>) {
        self.events.push(FeedbackEvent::Move {
            target,
            point,
            inside,
        });
    }
}

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
