use doorbot_store::{Gateway, IntentStore};

use crate::config::Config;

pub struct AppState {
    pub config: Config,
    pub gateway: Gateway,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = IntentStore::with_activity_capacity(config.activity_capacity);
        let gateway = Gateway::new(store, config.auto_revert);
        AppState { config, gateway }
    }
}
