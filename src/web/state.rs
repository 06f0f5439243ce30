use crate::model::{DbConnection, ModelManager};

/// Shared by every handler; cloning only bumps the pool's refcount.
#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
}

impl AppState {
    pub fn new(mm: ModelManager) -> Self {
        Self { mm }
    }

    pub fn from_connection(db: DbConnection) -> Self {
        Self::new(ModelManager::new(db))
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }
}
