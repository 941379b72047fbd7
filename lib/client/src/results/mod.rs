//! Lazy, single-pass streams over response bodies.
//!
//! Each stream owns a push parser and the response body. Bytes are only pulled from the body
//! when the parser can not produce the next element from what it already buffered. Dropping a
//! stream drops the response body, which aborts the HTTP exchange.

mod bindings;
mod json;
mod quads;
mod triples;

pub use bindings::BindingStream;
pub use json::BindingsParser;
pub use quads::QuadStream;

use crate::error::{ParseError, SparqlClientError};
use crate::transport::ResponseBody;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// A parser that is fed with chunks of bytes and produces elements as soon as they are complete.
///
/// The result of parsing does not depend on how the input is split into chunks.
pub trait PushParser {
    type Item;

    /// Adds a chunk of input.
    fn extend_from_slice(&mut self, chunk: &[u8]);

    /// Signals that no more input will follow.
    fn end(&mut self);

    /// Whether the input is fully parsed.
    fn is_end(&self) -> bool;

    /// Returns the next element if the buffered input is enough to complete one.
    fn parse_next(&mut self) -> Option<Result<Self::Item, ParseError>>;
}

/// Drives a [`PushParser`] with the chunks of a response body.
///
/// The stream is fused after the first error.
pub(crate) struct ParsedBody<P> {
    body: Option<ResponseBody>,
    parser: P,
    failed: bool,
}

impl<P: PushParser> ParsedBody<P> {
    pub(crate) fn new(body: ResponseBody, parser: P) -> Self {
        Self {
            body: Some(body),
            parser,
            failed: false,
        }
    }

    fn fail(&mut self) {
        self.failed = true;
        self.body = None;
    }
}

impl<P: PushParser + Unpin> Stream for ParsedBody<P> {
    type Item = Result<P::Item, SparqlClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.failed {
            return Poll::Ready(None);
        }

        loop {
            if let Some(result) = self.parser.parse_next() {
                if result.is_err() {
                    self.fail();
                }
                return Poll::Ready(Some(result.map_err(SparqlClientError::from)));
            }
            if self.parser.is_end() {
                self.body = None;
                return Poll::Ready(None);
            }

            // The parser needs more input.
            let Some(body) = self.body.as_mut() else {
                return Poll::Ready(None);
            };
            match ready!(body.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => self.parser.extend_from_slice(&chunk),
                Some(Err(error)) => {
                    self.fail();
                    return Poll::Ready(Some(Err(error.into())));
                }
                None => {
                    self.body = None;
                    self.parser.end();
                }
            }
        }
    }
}
