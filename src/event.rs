use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};

use crate::codec::RecordKind;

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Change {
    /// A record that did not exist before was written.
    Created,
    Deleted,
    /// An existing record was rewritten with a different payload or references.
    Updated,
    /// An existing record was re-observed unchanged. Only `last_seen` moved.
    Touched,
}

impl Display for Change {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Change::Created => write!(f, "Created"),
            Change::Deleted => write!(f, "Deleted"),
            Change::Updated => write!(f, "Updated"),
            Change::Touched => write!(f, "Touched"),
        }
    }
}

/// Event label: record kind × change, rendered as e.g. `EntityCreated` or `EdgeTagTouched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKind {
    pub record: RecordKind,
    pub change: Change,
}

impl EventKind {
    pub const ALL: [EventKind; 16] = {
        use Change::*;
        use RecordKind::*;
        [
            EventKind::new(Entity, Created),
            EventKind::new(Entity, Deleted),
            EventKind::new(Entity, Updated),
            EventKind::new(Entity, Touched),
            EventKind::new(Edge, Created),
            EventKind::new(Edge, Deleted),
            EventKind::new(Edge, Updated),
            EventKind::new(Edge, Touched),
            EventKind::new(EntityTag, Created),
            EventKind::new(EntityTag, Deleted),
            EventKind::new(EntityTag, Updated),
            EventKind::new(EntityTag, Touched),
            EventKind::new(EdgeTag, Created),
            EventKind::new(EdgeTag, Deleted),
            EventKind::new(EdgeTag, Updated),
            EventKind::new(EdgeTag, Touched),
        ]
    };

    pub const fn new(record: RecordKind, change: Change) -> Self {
        EventKind { record, change }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.record, self.change)
    }
}

/// One published mutation. `data` is the JSON text of the affected record, serialized once and
/// shared by every subscriber that receives the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: EventKind,
    pub data: Arc<str>,
}

impl ChangeEvent {
    pub fn new(kind: EventKind, data: impl Into<Arc<str>>) -> Self {
        ChangeEvent {
            kind,
            data: data.into(),
        }
    }
}

/// Renders the event as a text event stream frame.
impl Display for ChangeEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "event: {}\ndata: {}\n\n", self.kind, self.data)
    }
}

/// `event: <Label>\ndata: <json>\n\n`
pub fn render_frame(event: &ChangeEvent) -> String {
    event.to_string()
}
