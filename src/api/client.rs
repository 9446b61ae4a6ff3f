use crate::error::{Error, Result};
use async_trait::async_trait;
use log::{error, info};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client as HttpClient, Method};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// One outbound call against the REST service, relative to its base address.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Moves a request over the wire and hands back the decoded JSON body.
/// Failures come back as `Error::Network` (no response) or `Error::Status`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value>;
}

pub struct HttpTransport {
    pub http: HttpClient,
    pub base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::Config(format!("{} cannot be a base url", self.base_url)))?;
            path.pop_if_empty();
            for segment in &request.segments {
                path.push(segment);
            }
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let url = self.url_for(&request)?;
        let mut req = self.http.request(request.method.clone(), url);
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| Error::Network(e.to_string()))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            let body = serde_json::from_str::<Value>(&text).ok();
            return Err(Error::Status {
                status: status.as_u16(),
                message: body.as_ref().and_then(error_message),
                body,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        // Non-JSON success bodies ("Deleted") come back as a string; callers
        // that need an entity fail on decode, callers that ignore the body don't.
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

/// Finds `message` in an error body, either at the top level or nested under `data`.
pub fn error_message(body: &Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.get("data").and_then(|d| d.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Single entry point for outbound calls: logs every request and every failure,
/// then passes the outcome through untouched.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn http(base_url: &str) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(base_url)?)))
    }

    pub async fn request(&self, request: ApiRequest) -> Result<Value> {
        info!("Making {} request to {}", request.method, request.path());
        self.transport.send(request).await.inspect_err(|e| {
            error!("API Error: {}", e.log_payload());
        })
    }
}
