//! Queue quick connect API implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tfplug::context::Context;

use super::common::ApiQueryParams;
use super::{ApiError, Client};

/// The remote operations the queue quick connect resource depends on
///
/// `Client` implements this against the Connect REST API; tests substitute
/// scripted fakes.
#[async_trait]
pub trait QueueQuickConnectsApi: Send + Sync {
    /// POST /queues/{InstanceId}/{QueueId}/associate-quick-connects
    async fn associate_queue_quick_connects(
        &self,
        ctx: &Context,
        request: &AssociateQueueQuickConnectsRequest,
    ) -> Result<(), ApiError>;

    /// POST /queues/{InstanceId}/{QueueId}/disassociate-quick-connects
    async fn disassociate_queue_quick_connects(
        &self,
        ctx: &Context,
        request: &DisassociateQueueQuickConnectsRequest,
    ) -> Result<(), ApiError>;

    /// GET /queues/{InstanceId}/{QueueId}/quick-connects
    async fn list_queue_quick_connects(
        &self,
        ctx: &Context,
        request: &ListQueueQuickConnectsRequest,
    ) -> Result<ListQueueQuickConnectsResponse, ApiError>;

    /// maxResults used when walking listings
    fn page_size(&self) -> Option<u32> {
        None
    }
}

/// Request body for associating quick connects; ids travel in the path
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssociateQueueQuickConnectsRequest {
    #[serde(skip)]
    pub instance_id: String,
    #[serde(skip)]
    pub queue_id: String,
    pub quick_connect_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisassociateQueueQuickConnectsRequest {
    #[serde(skip)]
    pub instance_id: String,
    #[serde(skip)]
    pub queue_id: String,
    pub quick_connect_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListQueueQuickConnectsRequest {
    pub instance_id: String,
    pub queue_id: String,
    pub next_token: Option<String>,
    pub max_results: Option<u32>,
}

impl ListQueueQuickConnectsRequest {
    fn to_query_params(&self) -> ApiQueryParams {
        ApiQueryParams::new()
            .add_optional("maxResults", self.max_results)
            .add_optional("nextToken", self.next_token.as_deref())
    }
}

/// Response from GET /queues/{InstanceId}/{QueueId}/quick-connects
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListQueueQuickConnectsResponse {
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub quick_connect_summary_list: Vec<QuickConnectSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuickConnectSummary {
    pub id: Option<String>,
    pub arn: Option<String>,
    pub name: Option<String>,
    pub quick_connect_type: Option<String>,
    /// Epoch seconds
    pub last_modified_time: Option<f64>,
    pub last_modified_region: Option<String>,
}

fn queue_path(instance_id: &str, queue_id: &str, action: &str) -> String {
    format!(
        "/queues/{}/{}/{}",
        urlencoding::encode(instance_id),
        urlencoding::encode(queue_id),
        action
    )
}

/// Queues API for quick connect membership operations
pub struct QueuesApi<'a> {
    client: &'a Client,
}

impl<'a> QueuesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /queues/{InstanceId}/{QueueId}/associate-quick-connects
    pub async fn associate_quick_connects(
        &self,
        ctx: &Context,
        request: &AssociateQueueQuickConnectsRequest,
    ) -> Result<(), ApiError> {
        let path = queue_path(
            &request.instance_id,
            &request.queue_id,
            "associate-quick-connects",
        );
        self.client.post::<(), _>(ctx, &path, request).await
    }

    /// POST /queues/{InstanceId}/{QueueId}/disassociate-quick-connects
    pub async fn disassociate_quick_connects(
        &self,
        ctx: &Context,
        request: &DisassociateQueueQuickConnectsRequest,
    ) -> Result<(), ApiError> {
        let path = queue_path(
            &request.instance_id,
            &request.queue_id,
            "disassociate-quick-connects",
        );
        self.client.post::<(), _>(ctx, &path, request).await
    }

    /// GET /queues/{InstanceId}/{QueueId}/quick-connects
    pub async fn list_quick_connects(
        &self,
        ctx: &Context,
        request: &ListQueueQuickConnectsRequest,
    ) -> Result<ListQueueQuickConnectsResponse, ApiError> {
        let path = queue_path(&request.instance_id, &request.queue_id, "quick-connects");
        self.client
            .get_with_params(ctx, &path, &request.to_query_params())
            .await
    }
}

#[async_trait]
impl QueueQuickConnectsApi for Client {
    async fn associate_queue_quick_connects(
        &self,
        ctx: &Context,
        request: &AssociateQueueQuickConnectsRequest,
    ) -> Result<(), ApiError> {
        self.queues().associate_quick_connects(ctx, request).await
    }

    async fn disassociate_queue_quick_connects(
        &self,
        ctx: &Context,
        request: &DisassociateQueueQuickConnectsRequest,
    ) -> Result<(), ApiError> {
        self.queues().disassociate_quick_connects(ctx, request).await
    }

    async fn list_queue_quick_connects(
        &self,
        ctx: &Context,
        request: &ListQueueQuickConnectsRequest,
    ) -> Result<ListQueueQuickConnectsResponse, ApiError> {
        self.queues().list_quick_connects(ctx, request).await
    }

    fn page_size(&self) -> Option<u32> {
        Some(self.config().page_size)
    }
}

/// Walks every page of the queue's quick connect listing
///
/// Ids are returned in page order, then in order within each page. The
/// continuation token of each page is sent with the next request and the walk
/// ends at the first page without one. Any failed page aborts the walk, and so
/// does a token that was already sent.
pub async fn list_all_queue_quick_connect_ids(
    ctx: &Context,
    api: &dyn QueueQuickConnectsApi,
    instance_id: &str,
    queue_id: &str,
) -> Result<Vec<String>, ApiError> {
    let mut ids = Vec::new();
    let mut next_token: Option<String> = None;
    let mut sent_tokens: HashSet<String> = HashSet::new();
    let mut page = 0u32;

    loop {
        if let Some(err) = ctx.err() {
            return Err(ApiError::Cancelled(err.to_string()));
        }

        page += 1;
        tracing::debug!(instance_id, queue_id, page, "listing queue quick connects");

        let request = ListQueueQuickConnectsRequest {
            instance_id: instance_id.to_string(),
            queue_id: queue_id.to_string(),
            next_token: next_token.clone(),
            max_results: api.page_size(),
        };

        let response = api.list_queue_quick_connects(ctx, &request).await?;
        ids.extend(
            response
                .quick_connect_summary_list
                .into_iter()
                .filter_map(|summary| summary.id),
        );

        match response.next_token.filter(|token| !token.is_empty()) {
            None => return Ok(ids),
            Some(token) if !sent_tokens.insert(token.clone()) => {
                return Err(ApiError::StalledPagination(token));
            }
            Some(token) => next_token = Some(token),
        }
    }
}
