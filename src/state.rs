use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    repositories::ExamStore,
    services::{notifier::Notifier, submission::SubmissionCoordinator},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ExamStore>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Config,
}

impl AppState {
    pub fn coordinator(&self) -> SubmissionCoordinator {
        SubmissionCoordinator::new(Arc::clone(&self.store), Arc::clone(&self.notifier))
    }
}

impl FromRef<AppState> for Arc<dyn ExamStore> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.store)
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
