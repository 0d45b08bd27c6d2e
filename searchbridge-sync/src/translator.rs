//! Host notification → index event translation.

use crate::error::{SyncError, SyncResult};
use crate::event::IndexEvent;
use searchbridge_model::{Subject, TypeDiscovery};
use searchbridge_types::MutationKind;
use std::sync::Arc;
use tracing::error;

const PERSISTED_SUFFIX: &str = ".objectPersisted";
const UPDATED_SUFFIX: &str = ".objectUpdated";
const DELETED_SUFFIX: &str = ".objectDeleted";

/// Returns the mutation a notification name reports, or `None` for
/// notifications the bridge ignores.
///
/// Only the full suffix counts: `jpa.objectPersisted` matches,
/// `jpa.objectPersistedLater` does not.
pub fn classify(name: &str) -> Option<MutationKind> {
    if name.ends_with(PERSISTED_SUFFIX) {
        Some(MutationKind::Persisted)
    } else if name.ends_with(UPDATED_SUFFIX) {
        Some(MutationKind::Updated)
    } else if name.ends_with(DELETED_SUFFIX) {
        Some(MutationKind::Deleted)
    } else {
        None
    }
}

/// Returns true if the notification is one the bridge acts on.
pub fn is_interesting(name: &str) -> bool {
    classify(name).is_some()
}

/// Turns host notifications into [`IndexEvent`]s.
pub struct EventTranslator {
    discovery: Arc<dyn TypeDiscovery>,
}

impl EventTranslator {
    pub fn new(discovery: Arc<dyn TypeDiscovery>) -> Self {
        Self { discovery }
    }

    /// Builds the index event for a notification.
    ///
    /// Uninteresting names and non-searchable subjects yield `Ok(None)`. A
    /// searchable subject that is not a persisted [`searchbridge_model::Entity`]
    /// is an [`SyncError::InvariantViolation`].
    pub fn translate(
        &self,
        name: &str,
        subject: &Arc<dyn Subject>,
    ) -> SyncResult<Option<IndexEvent>> {
        let Some(mutation) = classify(name) else {
            return Ok(None);
        };
        if !self.discovery.is_searchable(subject.domain_type()) {
            return Ok(None);
        }

        let Some(entity) = Arc::clone(subject).into_entity() else {
            error!(
                notification = name,
                domain_type = %subject.domain_type(),
                "Searchable subject is not a persisted entity"
            );
            return Err(SyncError::InvariantViolation(format!(
                "only persisted entities can be indexed, got {subject:?} from {name}"
            )));
        };

        Ok(Some(IndexEvent::new(entity, mutation.index_kind())))
    }
}
