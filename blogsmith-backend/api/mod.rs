pub mod blog;
pub mod middleware;
mod routes;

use std::sync::Arc;

use axum::Router;

use crate::components::ComponentSessions;
use crate::registry::Registry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub sessions: Arc<ComponentSessions>,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            sessions: Arc::new(ComponentSessions::new()),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    routes::build_router(state)
}
