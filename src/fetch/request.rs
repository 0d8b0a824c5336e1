use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::config::FetchConfig;

use super::error::RequestError;
use super::options::{FetchOptions, Method};

/// One request as handed to a [`Requester`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, options: &FetchOptions) -> Self {
        Self {
            url: url.into(),
            method: options.method,
            headers: options.headers.clone(),
            body: options.body.clone(),
        }
    }
}

/// Raw response. Status codes are not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Request capability consumed by the fetch and image adapters.
#[async_trait]
pub trait Requester: Send + Sync {
    async fn send(&self, request: &FetchRequest) -> Result<FetchResponse, RequestError>;
}

/// [`Requester`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRequester {
    client: Client,
}

impl HttpRequester {
    pub fn new(config: &FetchConfig) -> Result<Self, RequestError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(u64::from(config.connect_timeout_seconds)))
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(RequestError::Client)?;

        Ok(Self { client })
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Requester for HttpRequester {
    async fn send(&self, request: &FetchRequest) -> Result<FetchResponse, RequestError> {
        if request.url.trim().is_empty() {
            return Err(RequestError::Invalid("empty url".to_string()));
        }

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url.as_str());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RequestError::Transport {
                url: request.url.clone(),
                source: e,
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| RequestError::Transport {
                url: request.url.clone(),
                source: e,
            })?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status,
            bytes = body.len(),
            "Request completed"
        );

        Ok(FetchResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}
