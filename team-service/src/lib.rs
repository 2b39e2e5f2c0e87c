pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
pub mod token;
pub mod utils;

use std::sync::Arc;

use crate::config::TeamConfig;
use crate::handlers::TeamHandlers;
use crate::services::Mailer;
use crate::store::{StoreBackend, StoreGateway};

/// Everything a request needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TeamConfig>,
    pub store: StoreGateway,
    pub mailer: Arc<dyn Mailer>,
    pub teams: TeamHandlers,
}

impl AppState {
    pub fn new(config: TeamConfig, backend: Arc<dyn StoreBackend>, mailer: Arc<dyn Mailer>) -> Self {
        let config = Arc::new(config);
        let store = StoreGateway::new(backend);
        let teams = TeamHandlers::new(Arc::clone(&config), store.clone(), Arc::clone(&mailer));

        Self {
            config,
            store,
            mailer,
            teams,
        }
    }
}
