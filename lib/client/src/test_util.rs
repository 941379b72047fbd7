use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, RequestBody};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

type Responder =
    Box<dyn Fn(usize, &RecordedRequest) -> Result<MockResponse, TransportError> + Send + Sync>;

/// An [`HttpTransport`] that answers from a closure and records every request.
pub(crate) struct MockTransport {
    responder: Responder,
    requests: Mutex<Vec<RecordedRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// A request as seen by [`MockTransport`], with the body fully read.
#[derive(Clone, Debug)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn body_text(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|value| value.to_str().unwrap())
    }
}

impl MockTransport {
    pub fn new(
        responder: impl Fn(usize, &RecordedRequest) -> Result<MockResponse, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Answers every request with `200 OK` and `body`.
    pub fn ok(body: &'static str) -> Arc<Self> {
        Self::responding(MockResponse::ok(body))
    }

    /// Answers every request with `response`.
    pub fn responding(response: MockResponse) -> Arc<Self> {
        Self::new(move |_, _| Ok(response.clone()))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request(&self, index: usize) -> RecordedRequest {
        self.requests()[index].clone()
    }

    /// The highest number of requests that were in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        let result = self.receive(request).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl MockTransport {
    async fn receive(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tokio::task::yield_now().await;
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let (body, body_error) = match body {
            RequestBody::Empty => (Bytes::new(), None),
            RequestBody::Bytes(bytes) => (bytes, None),
            RequestBody::Stream(mut chunks) => {
                let mut buffer = BytesMut::new();
                let mut error = None;
                while let Some(chunk) = chunks.next().await {
                    match chunk {
                        Ok(chunk) => buffer.extend_from_slice(&chunk),
                        Err(e) => {
                            error = Some(e);
                            break;
                        }
                    }
                }
                (buffer.freeze(), error)
            }
        };

        let recorded = RecordedRequest {
            method,
            url,
            headers,
            body,
        };
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(recorded.clone());
            requests.len() - 1
        };
        if let Some(error) = body_error {
            return Err(TransportError::new("The request body failed", error));
        }
        (self.responder)(index, &recorded).map(MockResponse::into_response)
    }
}

/// A canned response of [`MockTransport`].
#[derive(Clone, Debug)]
pub(crate) struct MockResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    chunk_size: Option<usize>,
}

impl MockResponse {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::status(StatusCode::OK, body)
    }

    pub fn status(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            chunk_size: None,
        }
    }

    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self
    }

    /// Splits the body into chunks of `size` bytes.
    pub fn chunked(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    pub fn into_response(self) -> HttpResponse {
        let chunk_size = self.chunk_size.unwrap_or(self.body.len().max(1));
        let chunks = self
            .body
            .chunks(chunk_size)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect::<Vec<_>>();
        HttpResponse::new(self.status, self.headers, stream::iter(chunks).boxed())
    }
}
