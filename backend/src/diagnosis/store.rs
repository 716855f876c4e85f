use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{DiagnosisResult, HandoffSlot};
use uuid::Uuid;

/// Latest diagnosis per signed-in user. Results never cross sessions.
#[derive(Clone, Default)]
pub struct DiagnosisStore {
    slots: Arc<Mutex<HashMap<Uuid, HandoffSlot>>>,
}

impl DiagnosisStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, HandoffSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, user_id: Uuid, result: DiagnosisResult) {
        self.lock().entry(user_id).or_default().set(result);
    }

    pub fn get(&self, user_id: Uuid) -> Option<DiagnosisResult> {
        self.lock().get(&user_id).and_then(|slot| slot.get().cloned())
    }

    pub fn get_or_default(&self, user_id: Uuid) -> DiagnosisResult {
        self.lock()
            .get(&user_id)
            .map(HandoffSlot::get_or_default)
            .unwrap_or_else(DiagnosisResult::placeholder)
    }

    pub fn clear(&self, user_id: Uuid) {
        self.lock().remove(&user_id);
    }
}
