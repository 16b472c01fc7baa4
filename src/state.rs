//! The one piece of shared, mutable-until-installed state: the dataset
//! pointer. Written once on successful load, read-only thereafter.

use std::sync::{Arc, RwLock};

use crate::dataset::Dataset;

#[derive(Clone, Default)]
pub struct AppState {
    dataset: Arc<RwLock<Option<Arc<Dataset>>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the dataset. Requests racing this call either see the old
    /// state (`None`, pre-load) or the new one — never a partial dataset.
    pub fn install(&self, dataset: Dataset) {
        let mut guard = self.dataset.write().expect("dataset lock poisoned");
        *guard = Some(Arc::new(dataset));
    }

    /// `None` before load completes.
    pub fn get(&self) -> Option<Arc<Dataset>> {
        self.dataset.read().expect("dataset lock poisoned").clone()
    }
}
