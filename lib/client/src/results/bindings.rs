use crate::error::SparqlClientError;
use crate::results::json::BindingsParser;
use crate::results::ParsedBody;
use crate::transport::HttpResponse;
use futures::{Stream, TryStreamExt};
use sparql_http_model::BindingRow;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The rows of a SELECT response, parsed while the body is received.
///
/// Rows are yielded in the order of the document. The stream can only be consumed once.
pub struct BindingStream {
    inner: ParsedBody<BindingsParser>,
}

impl BindingStream {
    /// Parses the body of `response` as SPARQL 1.1 Query Results JSON.
    pub fn new(response: HttpResponse) -> Self {
        Self {
            inner: ParsedBody::new(response.into_body(), BindingsParser::new()),
        }
    }

    pub async fn try_collect_to_vec(self) -> Result<Vec<BindingRow>, SparqlClientError> {
        self.try_collect().await
    }
}

impl Stream for BindingStream {
    type Item = Result<BindingRow, SparqlClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
