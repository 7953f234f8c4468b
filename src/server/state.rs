use std::sync::Arc;

use anyhow::Result;

use crate::api::GraphClient;
use crate::auth::{AuthConfig, TokenProvider};
use crate::config::Config;
use crate::trips::TripRegistry;

/// Shared by every request for the life of the process.
pub struct AppState {
    pub config: Config,
    pub graph: GraphClient,
    pub tokens: TokenProvider,
    pub trips: TripRegistry,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let graph = GraphClient::from_config(&config)?;
        let tokens = TokenProvider::new(AuthConfig::from_config(&config));

        Ok(Arc::new(Self {
            config,
            graph,
            tokens,
            trips: TripRegistry::new(),
        }))
    }
}
