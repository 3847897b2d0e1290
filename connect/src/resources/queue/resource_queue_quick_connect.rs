//! Queue quick connect association resource
//!
//! Binds a set of quick connects to a queue. Every attribute forces
//! replacement, so the association is created once, refreshed from the
//! remote listing and removed as a whole.

use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic};

use super::model::{reconcile_order, AssociationId, QueueQuickConnectModel, ID_SEPARATOR};
use crate::api::queues::{AssociateQueueQuickConnectsRequest, DisassociateQueueQuickConnectsRequest};
use crate::api::{list_all_queue_quick_connect_ids, QueueQuickConnectsApi};
use crate::ConnectProviderData;

pub const TYPE_NAME: &str = "connect_queue_quick_connect";

const RESOURCE_NAME: &str = "Connect Queue Quick Connect Association";

/// Deadline applied to create and delete
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Limit of the associate API
pub const MAX_QUICK_CONNECT_IDS: usize = 50;

#[derive(Default)]
pub struct QueueQuickConnectResource {
    provider_data: Option<ConnectProviderData>,
}

impl QueueQuickConnectResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resource already wired to `api`, bypassing provider configuration
    pub fn with_api(api: Arc<dyn QueueQuickConnectsApi>) -> Self {
        Self {
            provider_data: Some(ConnectProviderData::with_api(api)),
        }
    }

    fn api(&self) -> Result<&dyn QueueQuickConnectsApi, Diagnostic> {
        self.provider_data
            .as_ref()
            .map(|data| data.api.as_ref())
            .ok_or_else(|| {
                Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                )
            })
    }
}

/// `<action> Connect Queue Quick Connect Association (<instance-id>): <error>`
fn problem(action: &str, instance_id: &str, err: &dyn std::fmt::Display) -> Diagnostic {
    Diagnostic::error(
        format!("{} {} ({}): {}", action, RESOURCE_NAME, instance_id, err),
        err.to_string(),
    )
}

fn validate_identifier(config_value: &Dynamic, name: &str, diagnostics: &mut Vec<Diagnostic>) {
    let Dynamic::String(value) = config_value else {
        return;
    };

    if value.is_empty() {
        diagnostics.push(
            Diagnostic::error(
                format!("Invalid {}", name),
                format!("{} must not be empty", name),
            )
            .with_attribute(AttributePath::new(name)),
        );
    } else if value.contains(ID_SEPARATOR) {
        diagnostics.push(
            Diagnostic::error(
                format!("Invalid {}", name),
                format!("{} must not contain '{}'", name, ID_SEPARATOR),
            )
            .with_attribute(AttributePath::new(name)),
        );
    }
}

#[async_trait]
impl Resource for QueueQuickConnectResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Associates quick connects with an Amazon Connect queue")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Identifier of the association, <instance_id>:<queue_id>")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("instance_id", AttributeType::String)
                    .description("Identifier of the Amazon Connect instance")
                    .required()
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("queue_id", AttributeType::String)
                    .description("Identifier of the queue")
                    .required()
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "quick_connect_ids",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Quick connects to associate with the queue")
                .required()
                .plan_modifier(RequiresReplaceIfChanged)
                .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];
        let config = &request.config;

        for name in ["instance_id", "queue_id"] {
            if let Ok(value) = config.get(&AttributePath::new(name)) {
                validate_identifier(value, name, &mut diagnostics);
            }
        }

        let ids_path = AttributePath::new("quick_connect_ids");
        if let Ok(Dynamic::List(items)) = config.get(&ids_path) {
            if items.is_empty() || items.len() > MAX_QUICK_CONNECT_IDS {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid quick_connect_ids",
                        format!(
                            "quick_connect_ids must contain between 1 and {} elements, got {}",
                            MAX_QUICK_CONNECT_IDS,
                            items.len()
                        ),
                    )
                    .with_attribute(ids_path.clone()),
                );
            }

            for (idx, item) in items.iter().enumerate() {
                if matches!(item, Dynamic::String(s) if s.is_empty()) {
                    diagnostics.push(
                        Diagnostic::error(
                            "Invalid quick_connect_ids",
                            "quick connect ids must not be empty",
                        )
                        .with_attribute(ids_path.clone().index(idx as i64)),
                    );
                }
            }
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let api = match self.api() {
            Ok(api) => api,
            Err(diag) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![diag],
                };
            }
        };

        let mut model = match QueueQuickConnectModel::from_value(&request.planned_state) {
            Ok(model) => model,
            Err(diagnostics) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let ctx = ctx.with_timeout(DEFAULT_TIMEOUT);
        let associate = AssociateQueueQuickConnectsRequest {
            instance_id: model.instance_id.clone(),
            queue_id: model.queue_id.clone(),
            quick_connect_ids: model.quick_connect_ids.clone(),
        };

        match api.associate_queue_quick_connects(&ctx, &associate).await {
            Ok(()) => {
                let id = model.association_id();
                tracing::info!(
                    instance_id = %model.instance_id,
                    queue_id = %model.queue_id,
                    count = model.quick_connect_ids.len(),
                    "associated quick connects with queue"
                );
                model.id = Some(id.to_string());
                CreateResourceResponse {
                    new_state: model.to_value(),
                    diagnostics: vec![],
                }
            }
            Err(e) => {
                // nothing was created, so no id is recorded
                model.id = None;
                CreateResourceResponse {
                    new_state: model.to_value(),
                    diagnostics: vec![problem("creating", &model.instance_id, &e)],
                }
            }
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let api = match self.api() {
            Ok(api) => api,
            Err(diag) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![diag],
                };
            }
        };

        let mut model = match QueueQuickConnectModel::from_value(&request.current_state) {
            Ok(model) => model,
            Err(diagnostics) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        match list_all_queue_quick_connect_ids(&ctx, api, &model.instance_id, &model.queue_id)
            .await
        {
            Ok(remote_ids) => {
                model.quick_connect_ids = reconcile_order(&model.quick_connect_ids, remote_ids);
                model.id = Some(model.association_id().to_string());
                ReadResourceResponse {
                    new_state: Some(model.to_value()),
                    diagnostics: vec![],
                }
            }
            Err(e) => ReadResourceResponse {
                diagnostics: vec![problem("reading", &model.instance_id, &e)],
                new_state: Some(request.current_state),
            },
        }
    }

    async fn update(
        &self,
        _ctx: Context,
        request: UpdateResourceRequest,
    ) -> UpdateResourceResponse {
        // Every attribute requires replacement, so there is nothing to send
        match QueueQuickConnectModel::from_value(&request.planned_state) {
            Ok(mut model) => {
                model.id = Some(model.association_id().to_string());
                UpdateResourceResponse {
                    new_state: model.to_value(),
                    diagnostics: vec![],
                }
            }
            Err(diagnostics) => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            },
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let api = match self.api() {
            Ok(api) => api,
            Err(diag) => {
                return DeleteResourceResponse {
                    diagnostics: vec![diag],
                };
            }
        };

        let model = match QueueQuickConnectModel::from_value(&request.prior_state) {
            Ok(model) => model,
            Err(diagnostics) => return DeleteResourceResponse { diagnostics },
        };

        if model.quick_connect_ids.is_empty() {
            return DeleteResourceResponse {
                diagnostics: vec![],
            };
        }

        let ctx = ctx.with_timeout(DEFAULT_TIMEOUT);
        let disassociate = DisassociateQueueQuickConnectsRequest {
            instance_id: model.instance_id.clone(),
            queue_id: model.queue_id.clone(),
            quick_connect_ids: model.quick_connect_ids.clone(),
        };

        match api.disassociate_queue_quick_connects(&ctx, &disassociate).await {
            Ok(()) => {
                tracing::info!(
                    instance_id = %model.instance_id,
                    queue_id = %model.queue_id,
                    "disassociated quick connects from queue"
                );
                DeleteResourceResponse {
                    diagnostics: vec![],
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    instance_id = %model.instance_id,
                    queue_id = %model.queue_id,
                    "queue not found, treating association as removed: {}",
                    e
                );
                DeleteResourceResponse {
                    diagnostics: vec![],
                }
            }
            Err(e) => DeleteResourceResponse {
                diagnostics: vec![problem("deleting", &model.instance_id, &e)],
            },
        }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for QueueQuickConnectResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<ConnectProviderData>() {
                self.provider_data = Some(provider_data.clone());
            } else {
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract ConnectProviderData from provider data",
                ));
            }
        } else {
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the resource",
            ));
        }

        ConfigureResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithImportState for QueueQuickConnectResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };

        if let Err(e) = AssociationId::from_str(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[cfg(test)]
#[path = "./resource_queue_quick_connect_test.rs"]
mod resource_queue_quick_connect_test;
