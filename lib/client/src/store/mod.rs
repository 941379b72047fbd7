//! The [SPARQL 1.1 Graph Store HTTP Protocol](https://www.w3.org/TR/sparql11-http-rdf-update/).

mod partition;

use crate::config::{DefaultGraphSelector, WRITE_BODY_CHANNEL_CAPACITY};
use crate::endpoint::Endpoint;
use crate::error::{RequestBuildError, SparqlClientError, TransportError};
use crate::request::{append_query_parameters, append_raw_query};
use crate::response::check_response;
use crate::results::QuadStream;
use crate::transport::{HttpRequest, HttpResponse, RequestBody};
use bytes::Bytes;
use futures::channel::mpsc;
use futures::future::{select, Either};
use futures::{SinkExt, Stream, StreamExt};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use partition::{MethodSelector, PartitionState, Transition};
use sparql_http_model::vocab::media_type;
use sparql_http_model::{GraphName, Quad, TripleRef};
use std::io;
use std::num::NonZeroUsize;
use std::pin::{pin, Pin};
use tracing::{debug, warn};
use url::Url;

/// Options of [`GraphStore::write`].
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// The method of the first request for each graph. Defaults to `method`.
    pub first_method: Option<Method>,
    /// The method of all other requests.
    pub method: Method,
}

impl WriteOptions {
    /// Appends to the graphs with `POST`.
    pub fn append() -> Self {
        Self {
            first_method: None,
            method: Method::POST,
        }
    }

    /// Replaces each graph with a `PUT` and appends the rest of its quads with `POST`.
    pub fn replace() -> Self {
        Self {
            first_method: Some(Method::PUT),
            method: Method::POST,
        }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::append()
    }
}

/// Reads and writes graphs of a Graph Store Protocol endpoint.
///
/// Writes are streamed: the quads are serialized as N-Triples while the request is in flight.
/// A write is split into one request per run of quads of the same graph. If the endpoint has a
/// maximum number of quads per request, longer runs are split further. Requests are sent one
/// after the other and a request is only opened once the previous one completed.
///
/// A failed request aborts the write. Requests that already completed are not rolled back.
#[derive(Clone, Debug)]
pub struct GraphStore {
    endpoint: Endpoint,
}

impl GraphStore {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Reads `graph` with a `GET` request.
    pub async fn get(
        &self,
        graph: impl Into<GraphName>,
    ) -> Result<QuadStream, SparqlClientError> {
        self.read(Method::GET, graph).await
    }

    /// Reads `graph` with the given method. All quads of the result are in `graph`.
    pub async fn read(
        &self,
        method: Method,
        graph: impl Into<GraphName>,
    ) -> Result<QuadStream, SparqlClientError> {
        let graph = graph.into();
        let mut call_headers = HeaderMap::new();
        call_headers.insert(ACCEPT, HeaderValue::from_static(media_type::N_TRIPLES));
        let request = HttpRequest {
            method,
            url: self.graph_url(&graph)?,
            headers: self.endpoint.merge_headers(&call_headers),
            body: RequestBody::Empty,
        };
        let response = self.send(request).await?;
        Ok(QuadStream::new(response, graph))
    }

    /// Appends the quads to their graphs with `POST` requests.
    pub async fn post<S, E>(&self, quads: S) -> Result<(), SparqlClientError>
    where
        S: Stream<Item = Result<Quad, E>>,
        E: Into<SparqlClientError>,
    {
        self.write(WriteOptions::append(), quads).await
    }

    /// Replaces the graphs of the quads with their content.
    ///
    /// The first request for each graph is a `PUT`. If a graph is split into multiple requests,
    /// the following ones are `POST` requests.
    pub async fn put<S, E>(&self, quads: S) -> Result<(), SparqlClientError>
    where
        S: Stream<Item = Result<Quad, E>>,
        E: Into<SparqlClientError>,
    {
        self.write(WriteOptions::replace(), quads).await
    }

    /// Writes the quads in the order of the stream.
    ///
    /// # Errors
    ///
    /// Fails with the first error of a request or of `quads`. A request fails as soon as its
    /// response is an error, even if its body is not complete. No quads are pulled from `quads`
    /// after a failure.
    pub async fn write<S, E>(&self, options: WriteOptions, quads: S) -> Result<(), SparqlClientError>
    where
        S: Stream<Item = Result<Quad, E>>,
        E: Into<SparqlClientError>,
    {
        let mut quads = pin!(quads);
        let max_quads_per_request = self.endpoint.max_quads_per_request();
        let mut methods = MethodSelector::new(options.first_method, options.method);
        let mut state = PartitionState::Idle;
        let mut next = next_quad(&mut quads).await?;

        while let Some(quad) = next.take() {
            let (accumulating, _) = state.on_quad(&quad.graph_name, max_quads_per_request);
            let graph = quad.graph_name.clone();
            let method = methods.select(&graph);
            let (sender, receiver) = mpsc::channel(WRITE_BODY_CHANNEL_CAPACITY);
            let request = self.write_request(method.clone(), &graph, receiver)?;
            debug!(graph = %graph, method = %method, "opening graph store request");

            // The response can arrive before the body is complete, e.g. on a server error.
            let response = pin!(self.send(request));
            let feed = pin!(feed_partition(
                accumulating,
                quad,
                &mut quads,
                sender,
                max_quads_per_request,
            ));
            let fed = match select(response, feed).await {
                Either::Left((Err(error), _)) => return Err(error),
                Either::Left((Ok(_), feed)) => feed.await?,
                Either::Right((fed, response)) => {
                    let fed = fed?;
                    response.await?;
                    fed
                }
            };
            if fed.body_closed {
                return Err(TransportError::msg(
                    "The graph store request body was closed before all quads were sent",
                )
                .into());
            }

            if let PartitionState::Draining { graph, written } = &fed.state {
                debug!(graph = %graph, quads = written, "graph store request completed");
            }
            state = fed.state.on_drained();
            next = fed.next;
        }

        state = state.on_end();
        debug_assert_eq!(state, PartitionState::Closed);
        Ok(())
    }

    fn write_request(
        &self,
        method: Method,
        graph: &GraphName,
        body: mpsc::Receiver<io::Result<Bytes>>,
    ) -> Result<HttpRequest, RequestBuildError> {
        let mut call_headers = HeaderMap::new();
        call_headers.insert(CONTENT_TYPE, HeaderValue::from_static(media_type::N_TRIPLES));
        Ok(HttpRequest {
            method,
            url: self.graph_url(graph)?,
            headers: self.endpoint.merge_headers(&call_headers),
            body: RequestBody::Stream(body.boxed()),
        })
    }

    /// The store URL with the parameter that selects `graph`.
    fn graph_url(&self, graph: &GraphName) -> Result<Url, RequestBuildError> {
        let mut url = self
            .endpoint
            .store_url()
            .cloned()
            .ok_or(RequestBuildError::MissingUrl("store"))?;
        match graph {
            GraphName::NamedNode(graph) => {
                append_query_parameters(&mut url, [("graph", graph.as_str())]);
            }
            GraphName::DefaultGraph => match self.endpoint.default_graph_selector() {
                DefaultGraphSelector::Omit => (),
                DefaultGraphSelector::DefaultParameter => append_raw_query(&mut url, "default"),
            },
            GraphName::BlankNode(graph) => {
                return Err(RequestBuildError::BlankNodeGraph(graph.to_string()))
            }
        }
        Ok(url)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SparqlClientError> {
        check_response(self.endpoint.send(request).await?).await
    }
}

/// How the body of a partition ended.
struct FedPartition {
    state: PartitionState,
    /// The first quad of the following partition.
    next: Option<Quad>,
    /// The transport stopped reading the body.
    body_closed: bool,
}

/// Streams quads into the body of the open request until the partition is complete.
///
/// The body is closed by dropping `sender` on return.
async fn feed_partition<S, E>(
    mut state: PartitionState,
    first: Quad,
    quads: &mut Pin<&mut S>,
    mut sender: mpsc::Sender<io::Result<Bytes>>,
    max_quads_per_request: Option<NonZeroUsize>,
) -> Result<FedPartition, SparqlClientError>
where
    S: Stream<Item = Result<Quad, E>>,
    E: Into<SparqlClientError>,
{
    let mut quad = first;
    loop {
        if sender.send(Ok(n_triples_line(&quad))).await.is_err() {
            return Ok(FedPartition {
                state: state.on_end(),
                next: None,
                body_closed: true,
            });
        }

        quad = match quads.next().await {
            Some(Ok(quad)) => quad,
            Some(Err(error)) => {
                let error = error.into();
                if sender
                    .send(Err(io::Error::other(error.to_string())))
                    .await
                    .is_err()
                {
                    warn!("could not abort the graph store request body");
                }
                return Err(error);
            }
            None => {
                return Ok(FedPartition {
                    state: state.on_end(),
                    next: None,
                    body_closed: false,
                })
            }
        };

        let transition;
        (state, transition) = state.on_quad(&quad.graph_name, max_quads_per_request);
        if transition != Transition::Append {
            return Ok(FedPartition {
                state,
                next: Some(quad),
                body_closed: false,
            });
        }
    }
}

async fn next_quad<S, E>(quads: &mut Pin<&mut S>) -> Result<Option<Quad>, SparqlClientError>
where
    S: Stream<Item = Result<Quad, E>>,
    E: Into<SparqlClientError>,
{
    quads.next().await.transpose().map_err(Into::into)
}

/// Serializes the triple of `quad` as one N-Triples line. The graph name is not part of it.
fn n_triples_line(quad: &Quad) -> Bytes {
    let triple = TripleRef::new(&quad.subject, &quad.predicate, &quad.object);
    Bytes::from(format!("{triple} .\n"))
}
