use searchbridge_model::Entity;
use searchbridge_types::{EventId, IndexEventKind};
use std::fmt;
use std::sync::Arc;

/// One index operation for one persisted entity.
///
/// Created per notification (or explicit `index` call) and consumed once by
/// a delivery handler. Never persisted.
#[derive(Debug, Clone)]
pub struct IndexEvent {
    pub id: EventId,
    pub subject: Arc<Entity>,
    pub kind: IndexEventKind,
}

impl IndexEvent {
    pub fn new(subject: Arc<Entity>, kind: IndexEventKind) -> Self {
        Self {
            id: EventId::new(),
            subject,
            kind,
        }
    }

    pub fn index(subject: Arc<Entity>) -> Self {
        Self::new(subject, IndexEventKind::Index)
    }

    pub fn delete(subject: Arc<Entity>) -> Self {
        Self::new(subject, IndexEventKind::Delete)
    }
}

impl fmt::Display for IndexEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}#{} ({})",
            self.kind, self.subject.domain_type, self.subject.id, self.id
        )
    }
}
