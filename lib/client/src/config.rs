use serde::Deserialize;

/// The capacity, in N-Triples lines, of the channel that feeds a streamed write request.
///
/// The graph store writer suspends once this many lines are waiting to be sent.
pub const WRITE_BODY_CHANNEL_CAPACITY: usize = 64;

/// Holds the configuration of a SPARQL endpoint.
///
/// The configuration is validated and turned into an immutable [`Endpoint`](crate::Endpoint)
/// with [`Endpoint::try_new`](crate::Endpoint::try_new).
///
/// ```
/// use sparql_http_client::EndpointConfig;
///
/// let config = EndpointConfig {
///     endpoint_url: Some("http://localhost:3030/ds/query".to_owned()),
///     update_url: Some("http://localhost:3030/ds/update".to_owned()),
///     user: Some("admin".to_owned()),
///     password: Some("secret".to_owned()),
///     ..EndpointConfig::default()
/// };
/// assert!(config.store_url.is_none());
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EndpointConfig {
    /// The URL of the SPARQL query endpoint.
    pub endpoint_url: Option<String>,
    /// The URL of the SPARQL update endpoint.
    pub update_url: Option<String>,
    /// The URL of the SPARQL Graph Store endpoint.
    pub store_url: Option<String>,
    /// Headers sent with every request, in order. A name may appear multiple times.
    pub headers: Vec<(String, String)>,
    /// The user for HTTP Basic authentication. Only used together with `password`.
    pub user: Option<String>,
    /// The password for HTTP Basic authentication. Only used together with `user`.
    pub password: Option<String>,
    /// The maximum number of quads sent in one graph store write request. Unbounded if `None`.
    pub max_quads_per_request: Option<usize>,
    /// How the default graph is addressed in graph store requests.
    pub default_graph: DefaultGraphSelector,
}

/// How the default graph is selected in a Graph Store Protocol request.
///
/// Servers disagree on this. Named graphs are always selected with `?graph=<iri>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DefaultGraphSelector {
    /// Send no graph parameter at all.
    #[default]
    Omit,
    /// Send the `?default` parameter.
    DefaultParameter,
}
