//! Event classification
//!
//! Centralizes the decision of which decoded records reach the reducer.
//! Control records carry protocol information (a full-state snapshot or a
//! truncation marker) and must never show up as conversation messages.

use crate::wire::{CUTOFF_ID, STATE_SNAPSHOT_ID, StreamEvent};

/// Kind of control record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// `__state__`: full-state snapshot.
    StateSnapshot,
    /// `__cutoff__`: stream-truncation marker.
    Cutoff,
}

/// What to do with a decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Hand the event to the reducer unchanged.
    Forward,
    /// Drop it; it is a control record.
    Discard(ControlKind),
}

impl Disposition {
    pub fn is_forward(&self) -> bool {
        matches!(self, Disposition::Forward)
    }
}

/// How an ordinary event will act on an existing message with the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventShape {
    /// Text fragment to append.
    Delta,
    /// Tool invocation; always replaces wholesale, even when flagged as delta.
    ToolCall,
    /// Full content that replaces whatever was there.
    Full,
}

/// Control kind for a reserved id, if it is one.
pub fn control_kind(id: &str) -> Option<ControlKind> {
    match id {
        STATE_SNAPSHOT_ID => Some(ControlKind::StateSnapshot),
        CUTOFF_ID => Some(ControlKind::Cutoff),
        _ => None,
    }
}

/// Decide whether `event` reaches the reducer.
pub fn classify(event: &StreamEvent) -> Disposition {
    match control_kind(&event.id) {
        Some(kind) => Disposition::Discard(kind),
        None => Disposition::Forward,
    }
}

/// Shape of an ordinary event.
pub fn shape(event: &StreamEvent) -> EventShape {
    if event.tool_call.is_some() {
        EventShape::ToolCall
    } else if event.is_delta() {
        EventShape::Delta
    } else {
        EventShape::Full
    }
}
