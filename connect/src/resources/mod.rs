//! Resource implementations

pub mod queue;

pub use queue::QueueQuickConnectResource;
