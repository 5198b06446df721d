use crate::{config::Config, services::evaluator::Evaluator, store::SharedStore};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub evaluator: Evaluator,
    pub config: Config,
}

impl AppState {
    pub fn new(store: SharedStore, config: Config) -> Self {
        Self {
            evaluator: Evaluator::new(store.clone()),
            store,
            config,
        }
    }
}

impl FromRef<AppState> for SharedStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Evaluator {
    fn from_ref(state: &AppState) -> Self {
        state.evaluator.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
