use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::domain::{InspectionId, SessionId};

/// Where an auditor left off in a walkthrough, keyed by client session and inspection.
pub trait ResumptionStore: Send + Sync {
    fn position(&self, session_id: &SessionId, inspection_id: &InspectionId) -> Option<usize>;
    fn record(&self, session_id: &SessionId, inspection_id: &InspectionId, item_index: usize);
    fn clear(&self, session_id: &SessionId, inspection_id: &InspectionId);
}

/// Lookup table living as long as the client session that owns it.
#[derive(Debug, Default, Clone)]
pub struct ResumptionTable {
    positions: Arc<Mutex<HashMap<(SessionId, InspectionId), usize>>>,
}

impl ResumptionTable {
    fn positions(&self) -> MutexGuard<'_, HashMap<(SessionId, InspectionId), usize>> {
        // Entries are plain indices; a poisoned lock cannot leave them half written.
        self.positions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResumptionStore for ResumptionTable {
    fn position(&self, session_id: &SessionId, inspection_id: &InspectionId) -> Option<usize> {
        self.positions()
            .get(&(session_id.clone(), inspection_id.clone()))
            .copied()
    }

    fn record(&self, session_id: &SessionId, inspection_id: &InspectionId, item_index: usize) {
        self.positions()
            .insert((session_id.clone(), inspection_id.clone()), item_index);
    }

    fn clear(&self, session_id: &SessionId, inspection_id: &InspectionId) {
        self.positions()
            .remove(&(session_id.clone(), inspection_id.clone()));
    }
}
