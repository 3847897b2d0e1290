pub mod model;
pub mod resource_queue_quick_connect;

pub use model::{AssociationId, QueueQuickConnectModel};
pub use resource_queue_quick_connect::QueueQuickConnectResource;
