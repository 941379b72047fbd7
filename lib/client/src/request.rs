use crate::endpoint::Endpoint;
use crate::error::RequestBuildError;
use crate::transport::{HttpRequest, RequestBody};
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use sparql_http_model::vocab::media_type;
use std::fmt::{Display, Formatter};
use url::{form_urlencoded, Url};

/// How a query or update is transmitted to the endpoint.
///
/// See [SPARQL 1.1 Protocol](https://www.w3.org/TR/sparql11-protocol/#query-operation).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET` with the query in the URL.
    Get,
    /// `POST` with the query as the request body.
    PostDirect,
    /// `POST` with the query as an URL-encoded form.
    PostUrlencoded,
}

impl Operation {
    pub fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::PostDirect | Self::PostUrlencoded => Method::POST,
        }
    }
}

/// The kind of SPARQL request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryForm {
    Ask,
    /// A `CONSTRUCT` or `DESCRIBE` query.
    Construct,
    Select,
    Update,
}

impl QueryForm {
    /// The `Accept` header sent if neither the endpoint nor the call provides one.
    pub fn default_accept(self) -> &'static str {
        match self {
            Self::Ask | Self::Select => media_type::SPARQL_RESULTS_JSON,
            Self::Construct => "application/n-triples, text/turtle",
            Self::Update => media_type::ANY,
        }
    }

    /// The operation used if the call does not specify one.
    pub fn default_operation(self) -> Operation {
        match self {
            Self::Ask | Self::Construct | Self::Select => Operation::Get,
            Self::Update => Operation::PostUrlencoded,
        }
    }

    /// The name of the URL or form parameter that carries the request string.
    fn parameter(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Ask | Self::Construct | Self::Select => "query",
        }
    }
}

impl Display for QueryForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ask => "ask",
            Self::Construct => "construct",
            Self::Select => "select",
            Self::Update => "update",
        })
    }
}

/// Options of a single query or update call.
///
/// ```
/// use http::header::ACCEPT;
/// use http::HeaderValue;
/// use sparql_http_client::{Operation, RequestOptions};
///
/// let options = RequestOptions::default()
///     .with_operation(Operation::PostDirect)
///     .with_header(ACCEPT, HeaderValue::from_static("text/csv"))
///     .with_parameter("default-graph-uri", "http://example.org/graph");
/// assert_eq!(options.operation, Some(Operation::PostDirect));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Overrides the default operation of the query form.
    pub operation: Option<Operation>,
    /// Headers that take precedence over the endpoint headers.
    pub headers: HeaderMap,
    /// Additional protocol parameters, e.g. `default-graph-uri`.
    pub parameters: Vec<(String, String)>,
    /// Overrides the query URL of the endpoint. Updates always go to the update URL.
    pub url: Option<Url>,
}

impl RequestOptions {
    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }
}

/// Builds the HTTP request for a query or update.
///
/// Header precedence is: call headers, then endpoint headers, then the defaults of the
/// [`QueryForm`] and [`Operation`].
#[derive(Clone, Copy, Debug)]
pub struct RequestBuilder<'endpoint> {
    endpoint: &'endpoint Endpoint,
}

impl<'endpoint> RequestBuilder<'endpoint> {
    pub fn new(endpoint: &'endpoint Endpoint) -> Self {
        Self { endpoint }
    }

    /// Builds the request that sends `query` as a `form` request.
    ///
    /// # Errors
    ///
    /// Fails if the endpoint has no URL for `form`.
    pub fn build(
        &self,
        query: &str,
        form: QueryForm,
        options: &RequestOptions,
    ) -> Result<HttpRequest, RequestBuildError> {
        let operation = options.operation.unwrap_or(form.default_operation());
        let mut url = self.target_url(form, options)?;

        let mut headers = self.endpoint.merge_headers(&options.headers);
        if !headers.contains_key(ACCEPT) {
            headers.insert(ACCEPT, HeaderValue::from_static(form.default_accept()));
        }

        let parameters = options
            .parameters
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()));
        let body = match operation {
            Operation::Get => {
                append_query_parameters(
                    &mut url,
                    std::iter::once((form.parameter(), query)).chain(parameters),
                );
                RequestBody::Empty
            }
            Operation::PostDirect => {
                append_query_parameters(&mut url, parameters);
                set_default_content_type(&mut headers, media_type::SPARQL_QUERY_UTF8);
                RequestBody::Bytes(Bytes::copy_from_slice(query.as_bytes()))
            }
            Operation::PostUrlencoded => {
                set_default_content_type(&mut headers, media_type::FORM_URLENCODED);
                let encoded =
                    encode_pairs(std::iter::once((form.parameter(), query)).chain(parameters));
                RequestBody::Bytes(Bytes::from(encoded))
            }
        };

        Ok(HttpRequest {
            method: operation.method(),
            url,
            headers,
            body,
        })
    }

    fn target_url(
        &self,
        form: QueryForm,
        options: &RequestOptions,
    ) -> Result<Url, RequestBuildError> {
        let url = match form {
            QueryForm::Update => self.endpoint.update_url(),
            QueryForm::Ask | QueryForm::Construct | QueryForm::Select => {
                options.url.as_ref().or(self.endpoint.endpoint_url())
            }
        };
        url.cloned().ok_or(RequestBuildError::MissingUrl(match form {
            QueryForm::Update => "update",
            QueryForm::Ask | QueryForm::Construct | QueryForm::Select => "query",
        }))
    }
}

/// Appends URL-encoded parameters to the query string of `url`, keeping existing parameters.
pub(crate) fn append_query_parameters<'a>(
    url: &mut Url,
    parameters: impl IntoIterator<Item = (&'a str, &'a str)>,
) {
    append_raw_query(url, &encode_pairs(parameters));
}

/// Appends an already encoded fragment to the query string of `url`.
pub(crate) fn append_raw_query(url: &mut Url, encoded: &str) {
    if encoded.is_empty() {
        return;
    }
    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
        _ => encoded.to_owned(),
    };
    url.set_query(Some(&query));
}

/// Encodes pairs as `application/x-www-form-urlencoded`.
///
/// Spaces become `%20` instead of `+` as some endpoints decode `+` literally.
fn encode_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
        .replace('+', "%20")
}

fn set_default_content_type(headers: &mut HeaderMap, content_type: &'static str) {
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
}
