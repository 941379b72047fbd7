use crate::endpoint::Endpoint;
#[cfg(feature = "reqwest")]
use crate::{config::EndpointConfig, error::ContractError};
use crate::query::{ParsingQuery, QueryExecutor, RawQuery, StreamQuery};
use crate::store::GraphStore;

/// A client that returns the raw HTTP responses of queries.
pub type SimpleClient = Client<RawQuery>;

/// A client that returns lazily parsed streams.
pub type StreamClient = Client<StreamQuery>;

/// A client that collects query results into memory.
pub type ParsingClient = Client<ParsingQuery>;

/// Bundles a query executor and a graph store that share one [`Endpoint`].
///
/// ```no_run
/// use futures::TryStreamExt;
/// use sparql_http_client::{EndpointConfig, QueryExecutor, RequestOptions, StreamClient};
///
/// # tokio_test::block_on(async {
/// let client = StreamClient::from_config(EndpointConfig {
///     endpoint_url: Some("http://localhost:3030/ds/query".to_owned()),
///     ..EndpointConfig::default()
/// })?;
///
/// let mut rows = client
///     .query()
///     .select("SELECT ?s WHERE { ?s ?p ?o } LIMIT 10", RequestOptions::default())
///     .await?;
/// while let Some(row) = rows.try_next().await? {
///     println!("{row}");
/// }
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// # }).unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Client<Q> {
    endpoint: Endpoint,
    query: Q,
    store: Option<GraphStore>,
}

impl<Q: QueryExecutor> Client<Q> {
    /// Creates a client from an executor that sends its requests to `endpoint`.
    ///
    /// The graph store is only available if the endpoint has a store URL.
    pub fn with_executor(endpoint: Endpoint, query: Q) -> Self {
        let store = endpoint
            .store_url()
            .is_some()
            .then(|| GraphStore::new(endpoint.clone()));
        Self {
            endpoint,
            query,
            store,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn store(&self) -> Option<&GraphStore> {
        self.store.as_ref()
    }
}

impl SimpleClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_executor(endpoint.clone(), RawQuery::new(endpoint))
    }

    /// Creates a client that uses a default [`ReqwestTransport`](crate::ReqwestTransport).
    #[cfg(feature = "reqwest")]
    pub fn from_config(config: EndpointConfig) -> Result<Self, ContractError> {
        Ok(Self::new(Endpoint::from_config(config)?))
    }
}

impl StreamClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_executor(endpoint.clone(), StreamQuery::new(RawQuery::new(endpoint)))
    }

    /// Creates a client that uses a default [`ReqwestTransport`](crate::ReqwestTransport).
    #[cfg(feature = "reqwest")]
    pub fn from_config(config: EndpointConfig) -> Result<Self, ContractError> {
        Ok(Self::new(Endpoint::from_config(config)?))
    }
}

impl ParsingClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_executor(
            endpoint.clone(),
            ParsingQuery::new(StreamQuery::new(RawQuery::new(endpoint))),
        )
    }

    /// Creates a client that uses a default [`ReqwestTransport`](crate::ReqwestTransport).
    #[cfg(feature = "reqwest")]
    pub fn from_config(config: EndpointConfig) -> Result<Self, ContractError> {
        Ok(Self::new(Endpoint::from_config(config)?))
    }
}
