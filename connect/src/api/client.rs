use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tfplug::context::Context;

use super::common::{ApiErrorDetails, ApiQueryParams};
use super::error::ApiError;

/// Header carrying the service error code, e.g. `ResourceNotFoundException`
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Amazon Connect control plane client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth_header: Option<String>,
    config: ClientConfig,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// maxResults sent with every listing call
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            page_size: 100,
        }
    }
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(endpoint: &str, token: Option<&str>, insecure: bool) -> Result<Self, ApiError> {
        Self::with_config(endpoint, token, insecure, ClientConfig::default())
    }

    pub fn with_config(
        endpoint: &str,
        token: Option<&str>,
        insecure: bool,
        config: ClientConfig,
    ) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        let base_url = endpoint.trim_end_matches('/').to_string();
        let auth_header = token.map(|t| format!("Bearer {}", t));

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                auth_header,
                config,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Queue API operations
    pub fn queues(&self) -> crate::api::queues::QueuesApi<'_> {
        crate::api::queues::QueuesApi::new(self)
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(&self, ctx: &Context, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("GET request to: {}", url);

        let request = self.authorize(self.inner.http_client.get(&url));
        let text = self.execute(ctx, request).await?;
        parse_success_body(&text)
    }

    /// Execute a GET request with query parameters
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        params: &ApiQueryParams,
    ) -> Result<T, ApiError> {
        let full_path = format!("{}{}", path, params.to_query_string());
        self.get(ctx, &full_path).await
    }

    /// Execute a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        ctx: &Context,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("POST request to: {}", url);

        let request = self.authorize(self.inner.http_client.post(&url).json(body));
        let text = self.execute(ctx, request).await?;
        parse_success_body(&text)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.inner.auth_header {
            Some(header) => request.header(AUTHORIZATION, header),
            None => request,
        }
    }

    /// Sends the request and reads the body, racing both against the context.
    /// No retries.
    async fn execute(
        &self,
        ctx: &Context,
        request: reqwest::RequestBuilder,
    ) -> Result<String, ApiError> {
        if let Some(err) = ctx.err() {
            return Err(ApiError::Cancelled(err.to_string()));
        }

        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                let reason = ctx
                    .err()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "context cancelled".to_string());
                Err(ApiError::Cancelled(reason))
            }
            result = self.send(request) => result,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if !status.is_success() {
            return self.handle_error_response(response).await;
        }

        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);
        Ok(text)
    }

    /// Handle error response
    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let header_code = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ApiError::AuthError(status.as_u16()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited);
        }

        if status.is_server_error() {
            return Err(ApiError::ServiceUnavailable(status.as_u16()));
        }

        let details = ApiErrorDetails::from_response(header_code.as_deref(), &text);
        if details.is_none() {
            tracing::error!("Unrecognised error body (HTTP {}): {}", status, text);
        }

        let message = details
            .as_ref()
            .and_then(|d| match (&d.code, &d.message) {
                (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
                (None, Some(message)) => Some(message.clone()),
                (Some(code), None) => Some(code.clone()),
                (None, None) => None,
            })
            .unwrap_or(text);

        Err(ApiError::Api {
            status: status.as_u16(),
            message,
            details: details.map(Box::new),
        })
    }
}

/// Parse a successful response body; an empty body decodes as JSON null
fn parse_success_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let body = if text.trim().is_empty() { "null" } else { text };

    serde_json::from_str::<T>(body).map_err(|e| {
        tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
        ApiError::Parse(format!("Failed to parse response: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        value: String,
    }

    #[tokio::test]
    async fn client_sends_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/probe")
            .match_header("authorization", "Bearer secret-token")
            .with_body(r#"{"value":"ok"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), Some("secret-token"), false).unwrap();

        let probe: Probe = client.get(&Context::new(), "/probe").await.unwrap();
        assert_eq!(probe.value, "ok");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_omits_authorization_without_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/probe")
            .match_header("authorization", Matcher::Missing)
            .with_body(r#"{"value":"ok"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), None, false).unwrap();

        let _: Probe = client.get(&Context::new(), "/probe").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_posts_json_and_accepts_empty_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/probe")
            .match_header("content-type", "application/json")
            .match_body(Matcher::JsonString(r#"{"value":"in"}"#.to_string()))
            .with_status(200)
            .create_async()
            .await;

        let client = Client::new(&server.url(), None, false).unwrap();

        let body = serde_json::json!({ "value": "in" });
        let result: Result<(), ApiError> = client.post(&Context::new(), "/probe", &body).await;
        tokio_test::assert_ok!(result);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_strips_trailing_slash_from_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/probe")
            .with_body(r#"{"value":"ok"}"#)
            .create_async()
            .await;

        let client = Client::new(&format!("{}/", server.url()), None, false).unwrap();
        assert_eq!(client.base_url(), server.url());

        let _: Probe = client.get(&Context::new(), "/probe").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_maps_not_found_with_error_type_header() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/probe")
            .with_status(404)
            .with_header("x-amzn-ErrorType", "ResourceNotFoundException:http://internal/")
            .with_body(r#"{"Message":"Queue not found"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), None, false).unwrap();

        let err = client
            .get::<Probe>(&Context::new(), "/probe")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        match err {
            ApiError::Api {
                status, message, ..
            } => {
                assert_eq!(status, 404);
                assert_eq!(message, "ResourceNotFoundException: Queue not found");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn client_keeps_plain_text_error_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/probe")
            .with_status(400)
            .with_body("bad request")
            .create_async()
            .await;

        let client = Client::new(&server.url(), None, false).unwrap();

        let err = client
            .post::<(), _>(&Context::new(), "/probe", &serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApiError::Api { status: 400, ref message, details: None } if message == "bad request"
        ));
    }

    #[tokio::test]
    async fn client_classifies_auth_throttling_and_server_errors() {
        let mut server = Server::new_async().await;
        let _auth = server
            .mock("GET", "/auth")
            .with_status(403)
            .create_async()
            .await;
        let _throttled = server
            .mock("GET", "/throttled")
            .with_status(429)
            .create_async()
            .await;
        let _unavailable = server
            .mock("GET", "/unavailable")
            .with_status(503)
            .create_async()
            .await;

        let client = Client::new(&server.url(), None, false).unwrap();
        let ctx = Context::new();

        assert!(matches!(
            client.get::<Probe>(&ctx, "/auth").await,
            Err(ApiError::AuthError(403))
        ));
        assert!(matches!(
            client.get::<Probe>(&ctx, "/throttled").await,
            Err(ApiError::RateLimited)
        ));
        assert!(matches!(
            client.get::<Probe>(&ctx, "/unavailable").await,
            Err(ApiError::ServiceUnavailable(503))
        ));
    }

    #[tokio::test]
    async fn client_reports_unparseable_success_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/probe")
            .with_body("not json")
            .create_async()
            .await;

        let client = Client::new(&server.url(), None, false).unwrap();

        let result = client.get::<Probe>(&Context::new(), "/probe").await;
        assert!(matches!(result, Err(ApiError::Parse(_))));
    }

    #[tokio::test]
    async fn client_handles_network_errors() {
        let client = Client::new("http://localhost:99999", None, false).unwrap();

        let result = client.get::<Probe>(&Context::new(), "/probe").await;
        assert!(matches!(result, Err(ApiError::Request(_))));
    }

    #[tokio::test]
    async fn cancelled_context_skips_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/probe")
            .expect(0)
            .create_async()
            .await;

        let client = Client::new(&server.url(), None, false).unwrap();
        let ctx = Context::new();
        ctx.cancel();

        let result = client.get::<Probe>(&ctx, "/probe").await;
        assert!(matches!(result, Err(ApiError::Cancelled(_))));

        mock.assert_async().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deadline_aborts_in_flight_request() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/probe")
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(3));
                w.write_all(br#"{"value":"late"}"#)
            })
            .create_async()
            .await;

        let client = Client::new(&server.url(), None, false).unwrap();
        let ctx = Context::new().with_timeout(Duration::from_millis(100));

        let start = std::time::Instant::now();
        let result = client.get::<Probe>(&ctx, "/probe").await;

        assert!(matches!(result, Err(ApiError::Cancelled(_))));
        assert!(start.elapsed() < Duration::from_secs(3));
    }
}
