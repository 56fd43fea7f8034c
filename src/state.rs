use crate::dates::DayNormalizer;
use crate::store::LocalStore;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub store: LocalStore,
    pub normalizer: DayNormalizer,
    /// Held for the duration of a week save; a second save is turned away.
    pub saving: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: LocalStore, normalizer: DayNormalizer) -> Self {
        Self {
            store,
            normalizer,
            saving: Arc::new(Mutex::new(())),
        }
    }
}
