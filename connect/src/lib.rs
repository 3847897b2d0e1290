pub mod api;
pub mod config;
pub mod provider_data;
pub mod resources;

pub use provider_data::ConnectProviderData;

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, Provider, ProviderMetadataRequest,
    ProviderMetadataResponse, ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory,
    ValidateProviderConfigRequest, ValidateProviderConfigResponse,
};
use tfplug::resource::ResourceWithConfigure;
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::Diagnostic;

use config::ConnectConfig;
use resources::queue::resource_queue_quick_connect::TYPE_NAME as QUEUE_QUICK_CONNECT;
use resources::QueueQuickConnectResource;

#[derive(Default)]
pub struct ConnectProvider {
    provider_data: Option<Arc<ConnectProviderData>>,
}

impl ConnectProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Provider for ConnectProvider {
    fn type_name(&self) -> &str {
        "connect"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Amazon Connect provider")
            .attribute(
                AttributeBuilder::new("region", AttributeType::String)
                    .description("AWS region. Can also be set with AWS_REGION or AWS_DEFAULT_REGION")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("endpoint", AttributeType::String)
                    .description(
                        "Connect API endpoint. Can also be set with CONNECT_ENDPOINT. \
                         Defaults to https://connect.<region>.amazonaws.com",
                    )
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("token", AttributeType::String)
                    .description("Bearer token for the endpoint. Can also be set with CONNECT_TOKEN")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("insecure", AttributeType::Bool)
                    .description("Skip TLS verification. Can also be set with CONNECT_INSECURE")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("request_timeout_seconds", AttributeType::Number)
                    .description("Timeout for a single API request, in seconds, 1 to 1800 (default 30)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("page_size", AttributeType::Number)
                    .description("Page size used when listing quick connects, 1 to 100 (default 100)")
                    .optional()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        ValidateProviderConfigResponse {
            diagnostics: ConnectConfig::from_value(&request.config).err().unwrap_or_default(),
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let config = match ConnectConfig::from_value(&request.config) {
            Ok(config) => config,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        match config.build_client() {
            Ok(client) => {
                tracing::info!(
                    endpoint = %config.endpoint,
                    region = config.region.as_deref().unwrap_or(""),
                    "configured Connect provider"
                );
                let data = Arc::new(ConnectProviderData::new(client));
                self.provider_data = Some(data.clone());
                ConfigureProviderResponse {
                    diagnostics: vec![],
                    provider_data: Some(data as Arc<dyn Any + Send + Sync>),
                }
            }
            Err(e) => ConfigureProviderResponse {
                diagnostics: vec![Diagnostic::error(
                    format!("Failed to create API client: {}", e),
                    e.to_string(),
                )],
                provider_data: None,
            },
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
        resources.insert(
            QUEUE_QUICK_CONNECT.to_string(),
            Box::new(|| {
                Box::new(QueueQuickConnectResource::new()) as Box<dyn ResourceWithConfigure>
            }),
        );
        resources
    }
}
