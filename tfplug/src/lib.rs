//! tfplug - Terraform Plugin Framework for Rust
//!
//! The provider-facing half of a Terraform plugin: resource and provider
//! traits, schemas with plan modifiers, the planning step, dynamic values and
//! request contexts. Transport to Terraform core is supplied separately.

// Core modules
pub mod context;
pub mod error;
pub mod logging;
pub mod schema;
pub mod types;

// Provider API modules
pub mod provider;
pub mod resource;

// Helper modules
pub mod import;
pub mod plan;
pub mod plan_modifier;

// Re-exports for convenience
pub use context::Context;
pub use error::{Result, TfplugError};
pub use import::import_state_passthrough_id;
pub use logging::LogLevel;
pub use plan::{plan_resource_change, PlanResourceChangeRequest, PlanResourceChangeResponse};
pub use provider::{Provider, ResourceFactory};
pub use resource::{Resource, ResourceWithConfigure, ResourceWithImportState};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
