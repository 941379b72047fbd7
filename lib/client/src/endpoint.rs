use crate::config::{DefaultGraphSelector, EndpointConfig};
use crate::error::{ContractError, TransportError};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::fmt::{Debug, Formatter};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// The target of all requests of a client.
///
/// Holds the URLs of the query, update, and graph store endpoints, the headers sent with every
/// request, and the [`HttpTransport`] used to send them. An [`Endpoint`] is immutable after
/// construction and cheap to clone, so independent calls can share it.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<EndpointInner>,
}

struct EndpointInner {
    endpoint_url: Option<Url>,
    update_url: Option<Url>,
    store_url: Option<Url>,
    headers: HeaderMap,
    max_quads_per_request: Option<NonZeroUsize>,
    default_graph: DefaultGraphSelector,
    transport: Arc<dyn HttpTransport>,
}

impl Endpoint {
    /// Validates `config` and creates an endpoint that sends its requests with `transport`.
    ///
    /// # Errors
    ///
    /// Fails with a [`ContractError`] if no URL is configured at all, if a URL or header can not
    /// be parsed, or if the maximum number of quads per request is zero.
    pub fn try_new(
        config: EndpointConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ContractError> {
        let endpoint_url = parse_url("query", config.endpoint_url.as_deref())?;
        let update_url = parse_url("update", config.update_url.as_deref())?;
        let store_url = parse_url("store", config.store_url.as_deref())?;
        if endpoint_url.is_none() && update_url.is_none() && store_url.is_none() {
            return Err(ContractError::NoEndpointUrl);
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ContractError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ContractError::InvalidHeader(name.to_string()))?;
            headers.append(name, value);
        }

        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            let credentials = STANDARD.encode(format!("{user}:{password}"));
            let value = HeaderValue::from_str(&format!("Basic {credentials}"))
                .map_err(|_| ContractError::InvalidHeader(AUTHORIZATION.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let max_quads_per_request = match config.max_quads_per_request {
            None => None,
            Some(max) => Some(NonZeroUsize::new(max).ok_or(ContractError::ZeroQuadsPerRequest)?),
        };

        Ok(Self {
            inner: Arc::new(EndpointInner {
                endpoint_url,
                update_url,
                store_url,
                headers,
                max_quads_per_request,
                default_graph: config.default_graph,
                transport,
            }),
        })
    }

    /// Creates an endpoint that sends its requests with a default [`ReqwestTransport`](crate::ReqwestTransport).
    #[cfg(feature = "reqwest")]
    pub fn from_config(config: EndpointConfig) -> Result<Self, ContractError> {
        Self::try_new(config, Arc::new(crate::transport::ReqwestTransport::new()))
    }

    pub fn endpoint_url(&self) -> Option<&Url> {
        self.inner.endpoint_url.as_ref()
    }

    pub fn update_url(&self) -> Option<&Url> {
        self.inner.update_url.as_ref()
    }

    pub fn store_url(&self) -> Option<&Url> {
        self.inner.store_url.as_ref()
    }

    /// The headers sent with every request, including the `Authorization` header derived from
    /// the configured credentials.
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    pub fn max_quads_per_request(&self) -> Option<NonZeroUsize> {
        self.inner.max_quads_per_request
    }

    pub fn default_graph_selector(&self) -> DefaultGraphSelector {
        self.inner.default_graph
    }

    /// Merges the endpoint headers with the headers of a single call.
    ///
    /// A header given for the call replaces all values of the endpoint header with the same
    /// name. The endpoint headers are never modified.
    pub fn merge_headers(&self, headers: &HeaderMap) -> HeaderMap {
        let mut merged = self.inner.headers.clone();
        for name in headers.keys() {
            merged.remove(name);
        }
        for (name, value) in headers {
            merged.append(name.clone(), value.clone());
        }
        merged
    }

    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.inner.transport.send(request).await?;
        debug!(status = response.status().as_u16(), "received response");
        Ok(response)
    }
}

impl Debug for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("endpoint_url", &self.inner.endpoint_url)
            .field("update_url", &self.inner.update_url)
            .field("store_url", &self.inner.store_url)
            .field("max_quads_per_request", &self.inner.max_quads_per_request)
            .field("default_graph", &self.inner.default_graph)
            .finish_non_exhaustive()
    }
}

fn parse_url(kind: &'static str, url: Option<&str>) -> Result<Option<Url>, ContractError> {
    url.map(|url| {
        Url::parse(url).map_err(|error| ContractError::InvalidUrl {
            kind,
            url: url.to_owned(),
            error,
        })
    })
    .transpose()
}
