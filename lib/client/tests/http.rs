#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::stream;
use serde_json::json;
use sparql_http_client::model::{GraphName, Literal, NamedNode, Quad};
use sparql_http_client::{
    EndpointConfig, ParsingClient, QueryExecutor, RequestOptions, SparqlClientError, StreamClient,
};
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// N-Triples lines by graph IRI. `None` is the default graph.
type Graphs = Arc<Mutex<HashMap<Option<String>, Vec<String>>>>;
type Parameters = Query<HashMap<String, String>>;

async fn read_graph(State(graphs): State<Graphs>, Query(parameters): Parameters) -> Response {
    let graphs = graphs.lock().unwrap();
    match graphs.get(&parameters.get("graph").cloned()) {
        Some(lines) => (
            [(header::CONTENT_TYPE, "application/n-triples")],
            lines.concat(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "unknown graph").into_response(),
    }
}

async fn replace_graph(
    State(graphs): State<Graphs>,
    Query(parameters): Parameters,
    body: String,
) -> StatusCode {
    let lines = body.lines().map(|line| format!("{line}\n")).collect();
    graphs
        .lock()
        .unwrap()
        .insert(parameters.get("graph").cloned(), lines);
    StatusCode::CREATED
}

async fn append_graph(
    State(graphs): State<Graphs>,
    Query(parameters): Parameters,
    body: String,
) -> StatusCode {
    graphs
        .lock()
        .unwrap()
        .entry(parameters.get("graph").cloned())
        .or_default()
        .extend(body.lines().map(|line| format!("{line}\n")));
    StatusCode::NO_CONTENT
}

/// Answers `ASK` with whether any triple is stored and `SELECT` with the size of each named
/// graph.
async fn query(State(graphs): State<Graphs>, Query(parameters): Parameters) -> Response {
    let query = parameters.get("query").cloned().unwrap_or_default();
    if query.contains("boom") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    let graphs = graphs.lock().unwrap();
    if query.starts_with("ASK") {
        let boolean = graphs.values().any(|lines| !lines.is_empty());
        return Json(json!({ "head": {}, "boolean": boolean })).into_response();
    }
    let bindings = graphs
        .iter()
        .filter_map(|(graph, lines)| {
            let graph = graph.as_ref()?;
            Some(json!({
                "g": { "type": "uri", "value": graph },
                "n": {
                    "type": "literal",
                    "value": lines.len().to_string(),
                    "datatype": "http://www.w3.org/2001/XMLSchema#integer"
                }
            }))
        })
        .collect::<Vec<_>>();
    (
        [(header::CONTENT_TYPE, "application/sparql-results+json")],
        json!({ "head": { "vars": ["g", "n"] }, "results": { "bindings": bindings } }).to_string(),
    )
        .into_response()
}

/// Starts an in-memory SPARQL and graph store server and returns its base URL.
async fn serve() -> Result<String, Box<dyn Error>> {
    let app = Router::new()
        .route(
            "/store",
            get(read_graph).put(replace_graph).post(append_graph),
        )
        .route("/query", get(query))
        .with_state(Graphs::default());
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, app).await });
    Ok(format!("http://{address}"))
}

fn config(base: &str) -> EndpointConfig {
    EndpointConfig {
        endpoint_url: Some(format!("{base}/query")),
        store_url: Some(format!("{base}/store")),
        max_quads_per_request: Some(2),
        ..EndpointConfig::default()
    }
}

fn quads(graph: &GraphName, count: usize) -> Vec<Quad> {
    (0..count)
        .map(|index| {
            Quad::new(
                NamedNode::new_unchecked(format!("http://example.com/s{index}")),
                NamedNode::new_unchecked("http://example.com/p"),
                Literal::new_simple_literal(format!("value {index} \"quoted\"")),
                graph.clone(),
            )
        })
        .collect()
}

#[tokio::test]
async fn written_graphs_can_be_read_back() -> Result<(), Box<dyn Error>> {
    let base = serve().await?;
    let client = StreamClient::from_config(config(&base))?;
    let store = client.store().ok_or("no store")?;
    let named = GraphName::from(NamedNode::new("http://example.com/g")?);
    let mut input = quads(&named, 5);
    input.extend(quads(&GraphName::DefaultGraph, 3));

    store
        .put(stream::iter(input.clone().into_iter().map(Ok::<_, Infallible>)))
        .await?;

    let mut read = store.get(named).await?.try_collect_to_vec().await?;
    read.extend(
        store
            .get(GraphName::DefaultGraph)
            .await?
            .try_collect_to_vec()
            .await?,
    );
    assert_eq!(
        read.into_iter().collect::<HashSet<_>>(),
        input.into_iter().collect::<HashSet<_>>()
    );
    Ok(())
}

#[tokio::test]
async fn put_replaces_and_post_appends() -> Result<(), Box<dyn Error>> {
    let base = serve().await?;
    let client = StreamClient::from_config(config(&base))?;
    let store = client.store().ok_or("no store")?;
    let graph = GraphName::from(NamedNode::new("http://example.com/g")?);
    let source = |quads: Vec<Quad>| stream::iter(quads.into_iter().map(Ok::<_, Infallible>));

    store.put(source(quads(&graph, 3))).await?;
    store.put(source(quads(&graph, 1))).await?;
    store.post(source(quads(&graph, 2))).await?;

    let read = store.get(graph).await?.try_collect_dataset().await?;
    assert_eq!(read.len(), 2);
    Ok(())
}

#[tokio::test]
async fn queries_see_written_data() -> Result<(), Box<dyn Error>> {
    let base = serve().await?;
    let client = ParsingClient::from_config(config(&base))?;
    let graph = NamedNode::new("http://example.com/g")?;

    assert!(!client.query().ask("ASK { ?s ?p ?o }", RequestOptions::default()).await?);
    client
        .store()
        .ok_or("no store")?
        .post(stream::iter(
            quads(&graph.clone().into(), 3)
                .into_iter()
                .map(Ok::<_, Infallible>),
        ))
        .await?;
    assert!(client.query().ask("ASK { ?s ?p ?o }", RequestOptions::default()).await?);

    let rows = client
        .query()
        .select(
            "SELECT ?g (COUNT(*) AS ?n) { GRAPH ?g { ?s ?p ?o } } GROUP BY ?g",
            RequestOptions::default(),
        )
        .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("g"), Some(&graph.into()));
    assert_eq!(
        rows[0].get("n").map(ToString::to_string).as_deref(),
        Some("\"3\"^^<http://www.w3.org/2001/XMLSchema#integer>")
    );
    Ok(())
}

#[tokio::test]
async fn server_errors_carry_status_and_body() -> Result<(), Box<dyn Error>> {
    let base = serve().await?;
    let client = ParsingClient::from_config(config(&base))?;

    let error = client
        .query()
        .select("SELECT * { ?s ?p \"boom\" }", RequestOptions::default())
        .await
        .err()
        .ok_or("the query must fail")?;

    assert_eq!(error.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(error.to_string().contains("boom"));
    Ok(())
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() -> Result<(), Box<dyn Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    drop(listener);
    let client = ParsingClient::from_config(config(&format!("http://{address}")))?;

    let error = client
        .query()
        .ask("ASK {}", RequestOptions::default())
        .await
        .err()
        .ok_or("the query must fail")?;

    assert!(matches!(error, SparqlClientError::Transport(_)));
    assert_eq!(error.status(), None);
    Ok(())
}
