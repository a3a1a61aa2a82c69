//! Typed flag words.
//!
//! Bit values match the drawing file format so masks computed from stored
//! objects keep their meaning.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Per-object state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ObjectFlags: u32 {
        const LOCK        = 16;
        /// Object is an associate of another (labels, dimensions).
        const ASSOC       = 8192;
        const NO_LINKING  = 16777216;
        const NOT_VISIBLE = 268435456;
    }
}

bitflags! {
    /// Secondary object flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ExtraFlags: u32 {
        /// Connector-to-connector link; never a hit candidate.
        const CONN_TO_CONN     = 2097152;
        const DELETE_ON_UNHOOK = 2147483648;
    }
}

bitflags! {
    /// What an object can hook to, and what can hook to it.
    ///
    /// The same word is used for an object's hook flags (outgoing) and its
    /// target flags (incoming); a connection needs the two to intersect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct HookFlags: u32 {
        const SHAPE          = 1;
        const LINE           = 2;
        const H_ONLY         = 4;
        const V_ONLY         = 8;
        const C_HOOK         = 16;
        const ARRAY_MOD      = 32;
        /// Dragging this object moves the object it hooks to instead.
        const MOVE_TARGET    = 128;
        const ATTACH_TO_LINE = 256;
        const NO_SNAPS       = 512;
        const SHAPE_ON_LINE  = 1024;
        const AUTO_INSERT    = 8192;
        const FORCE_END      = 16384;
        const HOOK_NO_EXTRA  = 131072;
        const HOOK_REVERSE   = 262144;
        const NO_CONTINUOUS  = 524288;
    }
}

bitflags! {
    /// Layer state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct LayerFlags: u32 {
        const VISIBLE = 1;
        const ACTIVE  = 2;
        const NO_ADD  = 4;
    }
}

bitflags! {
    /// Drawing-wide linking preferences.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SessionFlags: u32 {
        /// Shapes may link to lines in array mode.
        const LINE_LINK  = 8;
        /// Shapes may link to shapes.
        const SHAPE_LINK = 16;
    }
}

bitflags! {
    /// Link table entry state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct LinkFlags: u32 {
        const MOVE          = 1;
        const CHANGE        = 2;
        const DELETE_TARGET = 4;
    }
}
