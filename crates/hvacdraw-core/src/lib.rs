//! HVAC drawing core
//!
//! Layer stack, selection, hit testing, connection search and move sets for
//! schematic drawings. The engine never renders; it reports highlight and
//! selection changes through the traits in [`feedback`].

pub mod config;
pub mod connect;
pub mod document;
pub mod drawing;
pub mod error;
pub mod feedback;
pub mod flags;
pub mod geometry;
pub mod layers;
pub mod links;
pub mod move_set;
pub mod selection;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use connect::{ConnectRequest, DragOptions, DragOutcome, DragSession, JoinTarget, PendingConnection};
pub use document::Document;
pub use drawing::{BaseClass, Drawable, DrawingObject, HitCode, HookPoint, HookPointId, ObjectId};
pub use error::{EngineError, EngineResult};
pub use feedback::{EditMode, Highlight, LinkFeedback, SelectionRenderer};
pub use hit_test::{FindOptions, HitResult, find_object_at};
pub use layers::{Layer, LayersManager};
pub use links::{Link, LinkTable, ListCode, hook_list};
pub use move_set::{MoveSet, MoveSetOptions, build_move_set};
pub use selection::{RubberBand, SelectionState, SelectionStats};
