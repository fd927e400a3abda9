use serde::Deserialize;

use crate::config::AppConfig;
use crate::session::SessionRegistry;
use crate::store::Store;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: AppConfig,
    pub store: Option<Store>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            store: None,
            sessions: SessionRegistry::default(),
        }
    }
}
