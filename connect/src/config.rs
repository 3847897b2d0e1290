//! Provider configuration
//!
//! Each value comes from the provider block first and falls back to an
//! environment variable.

use std::time::Duration;
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use url::Url;

use crate::api::{ApiError, Client, ClientConfig};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Matches the create and delete deadline; no single request may outlive it
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 30 * 60;

#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub endpoint: Url,
    pub region: Option<String>,
    pub token: Option<String>,
    pub insecure: bool,
    pub request_timeout: Duration,
    pub page_size: u32,
}

impl ConnectConfig {
    /// Reads and validates the provider block, reporting every problem found
    pub fn from_value(config: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let mut diagnostics = vec![];

        let region = string_attr(config, "region")
            .or_else(|| env_string("AWS_REGION"))
            .or_else(|| env_string("AWS_DEFAULT_REGION"));

        let endpoint = match string_attr(config, "endpoint").or_else(|| env_string("CONNECT_ENDPOINT"))
        {
            Some(raw) => parse_endpoint(&raw, &mut diagnostics),
            None => match &region {
                Some(region) => {
                    parse_endpoint(&format!("https://connect.{}.amazonaws.com", region), &mut diagnostics)
                }
                None => {
                    diagnostics.push(
                        Diagnostic::error(
                            "region is required (set in provider config or AWS_REGION env var)",
                            "Either region or endpoint must be configured to reach the Connect API",
                        )
                        .with_attribute(AttributePath::new("region")),
                    );
                    None
                }
            },
        };

        let token = string_attr(config, "token").or_else(|| env_string("CONNECT_TOKEN"));

        let insecure = config
            .get_bool(&AttributePath::new("insecure"))
            .ok()
            .or_else(|| {
                std::env::var("CONNECT_INSECURE")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok())
            })
            .unwrap_or(false);

        let defaults = ClientConfig::default();

        let request_timeout = match number_attr(config, "request_timeout_seconds") {
            Some(seconds)
                if seconds.fract() == 0.0
                    && (1.0..=MAX_REQUEST_TIMEOUT_SECS as f64).contains(&seconds) =>
            {
                Duration::from_secs(seconds as u64)
            }
            Some(seconds) => {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid request timeout",
                        format!(
                            "request_timeout_seconds must be a whole number between 1 and {}, got {}",
                            MAX_REQUEST_TIMEOUT_SECS, seconds
                        ),
                    )
                    .with_attribute(AttributePath::new("request_timeout_seconds")),
                );
                defaults.request_timeout
            }
            None => defaults.request_timeout,
        };

        let page_size = match number_attr(config, "page_size") {
            Some(size)
                if size.fract() == 0.0 && (1.0..=f64::from(MAX_PAGE_SIZE)).contains(&size) =>
            {
                size as u32
            }
            Some(size) => {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid page size",
                        format!(
                            "page_size must be a whole number between 1 and {}, got {}",
                            MAX_PAGE_SIZE, size
                        ),
                    )
                    .with_attribute(AttributePath::new("page_size")),
                );
                defaults.page_size
            }
            None => defaults.page_size,
        };

        match endpoint {
            Some(endpoint) if diagnostics.is_empty() => Ok(Self {
                endpoint,
                region,
                token,
                insecure,
                request_timeout,
                page_size,
            }),
            _ => Err(diagnostics),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: self.request_timeout,
            page_size: self.page_size,
            ..ClientConfig::default()
        }
    }

    pub fn build_client(&self) -> Result<Client, ApiError> {
        Client::with_config(
            self.endpoint.as_str(),
            self.token.as_deref(),
            self.insecure,
            self.client_config(),
        )
    }
}

fn parse_endpoint(raw: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Some(url),
        Ok(url) => {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid endpoint",
                    format!("endpoint must be an http(s) URL with a host, got {}", url),
                )
                .with_attribute(AttributePath::new("endpoint")),
            );
            None
        }
        Err(e) => {
            diagnostics.push(
                Diagnostic::error("Invalid endpoint", format!("{}: {}", raw, e))
                    .with_attribute(AttributePath::new("endpoint")),
            );
            None
        }
    }
}

/// Known, non-empty string attribute
fn string_attr(config: &DynamicValue, name: &str) -> Option<String> {
    config
        .get_string(&AttributePath::new(name))
        .ok()
        .filter(|s| !s.is_empty())
}

fn number_attr(config: &DynamicValue, name: &str) -> Option<f64> {
    match config.get(&AttributePath::new(name)) {
        Ok(Dynamic::Number(n)) => Some(*n),
        _ => None,
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}
