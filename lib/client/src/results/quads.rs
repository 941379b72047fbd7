use crate::error::SparqlClientError;
use crate::results::triples::QuadParser;
use crate::results::ParsedBody;
use crate::transport::HttpResponse;
use futures::{Stream, TryStreamExt};
use sparql_http_model::{Dataset, GraphName, Quad};
use std::pin::Pin;
use std::task::{Context, Poll};

/// The quads of an RDF response, parsed while the body is received.
///
/// All quads are in the graph the stream was created for. The stream can only be consumed once.
pub struct QuadStream {
    inner: ParsedBody<QuadParser>,
}

impl QuadStream {
    /// Parses the body of `response` according to its `Content-Type`.
    ///
    /// N-Triples and Turtle are supported. A response without media type is read as N-Triples.
    pub fn new(response: HttpResponse, graph_name: impl Into<GraphName>) -> Self {
        let parser = QuadParser::new(response.media_type(), graph_name.into());
        Self {
            inner: ParsedBody::new(response.into_body(), parser),
        }
    }

    pub async fn try_collect_to_vec(self) -> Result<Vec<Quad>, SparqlClientError> {
        self.try_collect().await
    }

    /// Collects the quads into a [`Dataset`]. Duplicates are removed.
    pub async fn try_collect_dataset(self) -> Result<Dataset, SparqlClientError> {
        self.try_fold(Dataset::new(), |mut dataset, quad| async move {
            dataset.insert(&quad);
            Ok(dataset)
        })
        .await
    }
}

impl Stream for QuadStream {
    type Item = Result<Quad, SparqlClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::test_util::MockResponse;
    use futures::StreamExt;

    const DOCUMENT: &str = "<http://example.org/s> <http://example.org/p> \"1\" .\n\
                            <http://example.org/s> <http://example.org/p> \"2\" .\n\
                            <http://example.org/s> <http://example.org/p> \"1\" .\n";

    #[tokio::test]
    async fn streams_quads_in_order() {
        let response = MockResponse::ok(DOCUMENT).chunked(5).into_response();
        let quads = QuadStream::new(response, GraphName::DefaultGraph)
            .try_collect_to_vec()
            .await
            .unwrap();

        assert_eq!(quads.len(), 3);
        assert_eq!(quads[1].object.to_string(), "\"2\"");
    }

    #[tokio::test]
    async fn dataset_removes_duplicates() {
        let response = MockResponse::ok(DOCUMENT).into_response();
        let dataset = QuadStream::new(response, GraphName::DefaultGraph)
            .try_collect_dataset()
            .await
            .unwrap();

        assert_eq!(dataset.len(), 2);
    }

    #[tokio::test]
    async fn stream_ends_after_error() {
        let response = MockResponse::ok("<http://example.org/s> .\n<http://example.org/s> .\n")
            .into_response();
        let mut stream = QuadStream::new(response, GraphName::DefaultGraph);

        assert!(matches!(
            stream.next().await,
            Some(Err(SparqlClientError::Parse(ParseError::Rdf(_))))
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn uses_the_response_media_type() {
        let response = MockResponse::ok("@prefix ex: <http://example.org/> . ex:s ex:p ex:o .")
            .with_content_type("text/turtle;charset=utf-8")
            .into_response();
        let quads = QuadStream::new(response, GraphName::DefaultGraph)
            .try_collect_to_vec()
            .await
            .unwrap();

        assert_eq!(quads.len(), 1);
    }
}
