use std::sync::Arc;

use crate::db::Repository;
use crate::providers::{ApodProvider, ImageSynthesizer};

pub mod pairs;

pub use pairs::{PairService, SortField, SortOrder};

// A container for all services to be injected into routes
#[derive(Clone)]
pub struct AppState {
    pub pair_service: Arc<PairService>,
    pub repo: Repository,
}

impl AppState {
    pub fn new(
        repo: Repository,
        apod: Arc<dyn ApodProvider>,
        synthesizer: Arc<dyn ImageSynthesizer>,
    ) -> Self {
        // Repository is cheap to clone (pool handle inside)
        Self {
            pair_service: Arc::new(PairService::new(repo.clone(), apod, synthesizer)),
            repo,
        }
    }
}
