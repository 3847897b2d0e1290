pub mod client;
pub mod common;
pub mod error;
pub mod queues;

#[cfg(test)]
pub mod test_helpers;

pub use client::{Client, ClientConfig};
pub use common::{ApiErrorDetails, ApiErrorResponse, ApiQueryParams};
pub use error::ApiError;
pub use queues::{list_all_queue_quick_connect_ids, QueueQuickConnectsApi, QueuesApi};
