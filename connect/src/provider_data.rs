//! Provider data structure passed to resources

use crate::api::{Client, QueueQuickConnectsApi};
use std::sync::Arc;

#[derive(Clone)]
pub struct ConnectProviderData {
    pub api: Arc<dyn QueueQuickConnectsApi>,
}

impl ConnectProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            api: Arc::new(client),
        }
    }

    pub fn with_api(api: Arc<dyn QueueQuickConnectsApi>) -> Self {
        Self { api }
    }
}
