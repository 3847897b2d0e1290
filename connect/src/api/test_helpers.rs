//! Test helpers for the Connect API

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tfplug::context::Context;

use super::queues::{
    AssociateQueueQuickConnectsRequest, DisassociateQueueQuickConnectsRequest,
    ListQueueQuickConnectsRequest, ListQueueQuickConnectsResponse, QueueQuickConnectsApi,
    QuickConnectSummary,
};
use super::{ApiError, Client};

pub fn create_test_client(url: &str) -> Client {
    Client::new(url, Some("test-token"), false).unwrap()
}

/// Builds one listing page
pub fn page(ids: &[&str], next_token: Option<&str>) -> ListQueueQuickConnectsResponse {
    ListQueueQuickConnectsResponse {
        next_token: next_token.map(str::to_string),
        quick_connect_summary_list: ids
            .iter()
            .map(|id| QuickConnectSummary {
                id: Some(id.to_string()),
                ..Default::default()
            })
            .collect(),
    }
}

type PageResult = Result<ListQueueQuickConnectsResponse, ApiError>;

/// Scripted in-memory stand-in for the Connect API that records every call
///
/// Listing calls consume scripted pages in order; once the script runs out
/// an empty final page is returned.
#[derive(Default)]
pub struct FakeQueueApi {
    pages: Mutex<VecDeque<PageResult>>,
    list_requests: Mutex<Vec<ListQueueQuickConnectsRequest>>,
    associate_requests: Mutex<Vec<AssociateQueueQuickConnectsRequest>>,
    disassociate_requests: Mutex<Vec<DisassociateQueueQuickConnectsRequest>>,
    associate_error: Mutex<Option<ApiError>>,
    disassociate_error: Mutex<Option<ApiError>>,
    page_size: Option<u32>,
}

impl FakeQueueApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: Vec<PageResult>) -> Self {
        let api = Self::new();
        api.push_pages(pages);
        api
    }

    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn push_pages(&self, pages: Vec<PageResult>) {
        self.pages.lock().unwrap().extend(pages);
    }

    /// The next associate call fails with `error`
    pub fn fail_associate(&self, error: ApiError) {
        *self.associate_error.lock().unwrap() = Some(error);
    }

    /// The next disassociate call fails with `error`
    pub fn fail_disassociate(&self, error: ApiError) {
        *self.disassociate_error.lock().unwrap() = Some(error);
    }

    pub fn list_calls(&self) -> usize {
        self.list_requests.lock().unwrap().len()
    }

    pub fn list_requests(&self) -> Vec<ListQueueQuickConnectsRequest> {
        self.list_requests.lock().unwrap().clone()
    }

    pub fn associate_requests(&self) -> Vec<AssociateQueueQuickConnectsRequest> {
        self.associate_requests.lock().unwrap().clone()
    }

    pub fn disassociate_requests(&self) -> Vec<DisassociateQueueQuickConnectsRequest> {
        self.disassociate_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueueQuickConnectsApi for FakeQueueApi {
    async fn associate_queue_quick_connects(
        &self,
        _ctx: &Context,
        request: &AssociateQueueQuickConnectsRequest,
    ) -> Result<(), ApiError> {
        self.associate_requests.lock().unwrap().push(request.clone());
        match self.associate_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn disassociate_queue_quick_connects(
        &self,
        _ctx: &Context,
        request: &DisassociateQueueQuickConnectsRequest,
    ) -> Result<(), ApiError> {
        self.disassociate_requests
            .lock()
            .unwrap()
            .push(request.clone());
        match self.disassociate_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn list_queue_quick_connects(
        &self,
        _ctx: &Context,
        request: &ListQueueQuickConnectsRequest,
    ) -> Result<ListQueueQuickConnectsResponse, ApiError> {
        self.list_requests.lock().unwrap().push(request.clone());
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(page(&[], None)))
    }

    fn page_size(&self) -> Option<u32> {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ClientConfig;

    #[test]
    fn client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout.as_secs(), 30);
        assert_eq!(config.connect_timeout.as_secs(), 10);
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_client_uses_default_page_size() {
        let client = create_test_client("http://localhost:1");
        assert_eq!(QueueQuickConnectsApi::page_size(&client), Some(100));
    }

    #[tokio::test]
    async fn fake_api_returns_empty_page_after_script() {
        let api = FakeQueueApi::with_pages(vec![Ok(page(&["qc-1"], None))]);
        let ctx = Context::new();
        let request = ListQueueQuickConnectsRequest::default();

        let first = api.list_queue_quick_connects(&ctx, &request).await.unwrap();
        let second = api.list_queue_quick_connects(&ctx, &request).await.unwrap();

        assert_eq!(first.quick_connect_summary_list.len(), 1);
        assert!(second.quick_connect_summary_list.is_empty());
        assert_eq!(api.list_calls(), 2);
    }
}
