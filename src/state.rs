use std::sync::Arc;

use crate::config::SeasonConfig;
use crate::database::Store;
use crate::services::finalization::FinalizationController;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub season: Arc<SeasonConfig>,
    pub finalization: FinalizationController,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, season: SeasonConfig) -> Self {
        let season = Arc::new(season);
        AppState {
            finalization: FinalizationController::new(store.clone(), season.clone()),
            store,
            season,
        }
    }
}
