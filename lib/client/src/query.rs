//! Executors for the four SPARQL query forms.
//!
//! [`RawQuery`] sends requests and returns the responses as they are. [`StreamQuery`] wraps an
//! executor that returns raw responses, checks their status and turns their bodies into lazy
//! streams. [`ParsingQuery`] wraps a streaming executor and collects the streams.

use crate::endpoint::Endpoint;
use crate::error::SparqlClientError;
use crate::request::{QueryForm, RequestBuilder, RequestOptions};
use crate::response::{check_response, parse_ask};
use crate::results::{BindingStream, QuadStream};
use crate::transport::HttpResponse;
use async_trait::async_trait;
use sparql_http_model::{BindingRow, Dataset, GraphName, Quad};
use tracing::debug;

/// Executes the SPARQL query forms against an endpoint.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    type Ask: Send;
    type Construct: Send;
    type Select: Send;
    type Update: Send;

    /// Runs an `ASK` query.
    async fn ask(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<Self::Ask, SparqlClientError>;

    /// Runs a `CONSTRUCT` or `DESCRIBE` query.
    async fn construct(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<Self::Construct, SparqlClientError>;

    /// Runs a `SELECT` query.
    async fn select(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<Self::Select, SparqlClientError>;

    /// Runs an update.
    async fn update(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<Self::Update, SparqlClientError>;
}

/// Sends the requests and returns the HTTP responses without looking at them.
#[derive(Clone, Debug)]
pub struct RawQuery {
    endpoint: Endpoint,
}

impl RawQuery {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn send(
        &self,
        query: &str,
        form: QueryForm,
        options: &RequestOptions,
    ) -> Result<HttpResponse, SparqlClientError> {
        let request = RequestBuilder::new(&self.endpoint).build(query, form, options)?;
        let operation = options.operation.unwrap_or(form.default_operation());
        debug!(form = %form, operation = ?operation, "sending SPARQL request");
        Ok(self.endpoint.send(request).await?)
    }
}

#[async_trait]
impl QueryExecutor for RawQuery {
    type Ask = HttpResponse;
    type Construct = HttpResponse;
    type Select = HttpResponse;
    type Update = HttpResponse;

    async fn ask(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, SparqlClientError> {
        self.send(query, QueryForm::Ask, &options).await
    }

    async fn construct(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, SparqlClientError> {
        self.send(query, QueryForm::Construct, &options).await
    }

    async fn select(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, SparqlClientError> {
        self.send(query, QueryForm::Select, &options).await
    }

    async fn update(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, SparqlClientError> {
        self.send(query, QueryForm::Update, &options).await
    }
}

/// Checks the status of the responses and parses their bodies lazily.
///
/// The quads of `CONSTRUCT` results are in the default graph.
#[derive(Clone, Debug)]
pub struct StreamQuery<E = RawQuery> {
    inner: E,
}

impl<E> StreamQuery<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<E> QueryExecutor for StreamQuery<E>
where
    E: QueryExecutor<
        Ask = HttpResponse,
        Construct = HttpResponse,
        Select = HttpResponse,
        Update = HttpResponse,
    >,
{
    type Ask = bool;
    type Construct = QuadStream;
    type Select = BindingStream;
    type Update = ();

    async fn ask(&self, query: &str, options: RequestOptions) -> Result<bool, SparqlClientError> {
        let response = check_response(self.inner.ask(query, options).await?).await?;
        parse_ask(response).await
    }

    async fn construct(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<QuadStream, SparqlClientError> {
        let response = check_response(self.inner.construct(query, options).await?).await?;
        Ok(QuadStream::new(response, GraphName::DefaultGraph))
    }

    async fn select(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<BindingStream, SparqlClientError> {
        let response = check_response(self.inner.select(query, options).await?).await?;
        Ok(BindingStream::new(response))
    }

    async fn update(&self, query: &str, options: RequestOptions) -> Result<(), SparqlClientError> {
        check_response(self.inner.update(query, options).await?).await?;
        Ok(())
    }
}

/// Collects the results of a streaming executor into memory.
#[derive(Clone, Debug)]
pub struct ParsingQuery<E = StreamQuery> {
    inner: E,
}

impl<E> ParsingQuery<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

impl<E> ParsingQuery<E>
where
    E: QueryExecutor<Construct = QuadStream>,
{
    /// Runs a `CONSTRUCT` or `DESCRIBE` query and collects the triples into a [`Dataset`].
    pub async fn construct_dataset(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<Dataset, SparqlClientError> {
        self.inner
            .construct(query, options)
            .await?
            .try_collect_dataset()
            .await
    }
}

#[async_trait]
impl<E> QueryExecutor for ParsingQuery<E>
where
    E: QueryExecutor<Ask = bool, Construct = QuadStream, Select = BindingStream, Update = ()>,
{
    type Ask = bool;
    type Construct = Vec<Quad>;
    type Select = Vec<BindingRow>;
    type Update = ();

    async fn ask(&self, query: &str, options: RequestOptions) -> Result<bool, SparqlClientError> {
        self.inner.ask(query, options).await
    }

    async fn construct(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<Vec<Quad>, SparqlClientError> {
        self.inner
            .construct(query, options)
            .await?
            .try_collect_to_vec()
            .await
    }

    async fn select(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<Vec<BindingRow>, SparqlClientError> {
        self.inner
            .select(query, options)
            .await?
            .try_collect_to_vec()
            .await
    }

    async fn update(&self, query: &str, options: RequestOptions) -> Result<(), SparqlClientError> {
        self.inner.update(query, options).await
    }
}
