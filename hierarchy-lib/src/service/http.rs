//! HTTP implementation of the tree service

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use url::Url;

use super::ListParams;
use super::MoveRequest;
use super::Params;
use super::RemoteTreeService;
use super::params_to_query;
use crate::error::ServiceError;
use crate::model::ListResponse;
use crate::model::Record;
use crate::model::SkelType;
use crate::model::ViewResponse;

/// Talks to the JSON backend over HTTP.
///
/// Endpoints are addressed as `<base>/json/<module>/<action>`. The service is
/// cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```ignore
/// use hierarchy_lib::service::HttpTreeService;
///
/// let service = HttpTreeService::builder()
///     .base_url("https://admin.example.com")
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct HttpTreeService {
    inner: Arc<HttpTreeServiceInner>,
}

struct HttpTreeServiceInner {
    base_url: Url,
    http_client: Client,
    timeout: Option<Duration>,
}

impl HttpTreeService {
    /// Creates a new builder for constructing a service.
    pub fn builder() -> HttpTreeServiceBuilder<Missing> {
        HttpTreeServiceBuilder::new()
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Builds `<base>/json/<module>/<segments...>`.
    pub fn endpoint(&self, module: &str, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.inner.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ServiceError::InvalidUrl(self.inner.base_url.to_string()))?;
            path.pop_if_empty().push("json").push(module);
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, mut request: RequestBuilder) -> Result<T, ServiceError> {
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Timeout(self.inner.timeout.unwrap_or_default())
            } else {
                ServiceError::from(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ServiceError::http(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| ServiceError::parse_with_body(e.to_string(), body))
    }
}

#[async_trait]
impl RemoteTreeService for HttpTreeService {
    async fn list(
        &self,
        module: &str,
        skel_type: SkelType,
        params: &ListParams,
    ) -> Result<ListResponse, ServiceError> {
        let mut url = self.endpoint(module, &["list", skel_type.as_str()])?;
        url.query_pairs_mut().extend_pairs(params.to_query());
        log::debug!("[HttpTreeService::list] GET {}", url);
        let request = self.inner.http_client.get(url);
        self.send(request).await
    }

    async fn list_root_nodes(&self, module: &str, params: &Params) -> Result<Vec<Record>, ServiceError> {
        let mut url = self.endpoint(module, &["listRootNodes"])?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params_to_query(params));
        }
        log::debug!("[HttpTreeService::list_root_nodes] GET {}", url);
        let request = self.inner.http_client.get(url);
        self.send(request).await
    }

    async fn view(&self, module: &str, skel_type: SkelType, key: &str) -> Result<Record, ServiceError> {
        let url = self.endpoint(module, &["view", skel_type.as_str(), key])?;
        log::debug!("[HttpTreeService::view] GET {}", url);
        let request = self.inner.http_client.get(url);
        let answer: ViewResponse = self.send(request).await?;
        Ok(answer.values)
    }

    async fn move_entry(&self, module: &str, request: &MoveRequest) -> Result<(), ServiceError> {
        let url = self.endpoint(module, &["move"])?;
        log::debug!("[HttpTreeService::move_entry] POST {} key={}", url, request.key);
        let builder = self.inner.http_client.post(url).form(&request.to_form());
        let _: serde_json::Value = self.send(builder).await?;
        Ok(())
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing an [`HttpTreeService`].
///
/// Uses the typestate pattern so the base URL must be set before `build`.
pub struct HttpTreeServiceBuilder<Base> {
    base_url: Base,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl HttpTreeServiceBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: Missing,
            timeout: None,
            connect_timeout: None,
            http_client: None,
        }
    }

    /// Sets the backend base URL.
    pub fn base_url(self, url: impl Into<String>) -> HttpTreeServiceBuilder<Set<String>> {
        HttpTreeServiceBuilder {
            base_url: Set(url.into()),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl Default for HttpTreeServiceBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> HttpTreeServiceBuilder<B> {
    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout, applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl HttpTreeServiceBuilder<Set<String>> {
    /// Builds the [`HttpTreeService`].
    pub fn build(self) -> Result<HttpTreeService, ServiceError> {
        let base_url =
            Url::parse(&self.base_url.0).map_err(|_| ServiceError::InvalidUrl(self.base_url.0.clone()))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(HttpTreeService {
            inner: Arc::new(HttpTreeServiceInner {
                base_url,
                http_client,
                timeout: self.timeout,
            }),
        })
    }
}
