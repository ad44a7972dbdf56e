use crate::config::Config;
use crate::db::DbPool;
use crate::pest::PestStore;
use crate::upload::UploadStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub pests: Arc<dyn PestStore>,
    pub uploads: UploadStore,
    pub config: Arc<Config>,
}

impl axum::extract::FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
