//! The seam between the client and the HTTP stack.
//!
//! The client never opens connections itself. It builds [`HttpRequest`]s and hands them to an
//! [`HttpTransport`], which returns an [`HttpResponse`] whose body is pulled lazily. Dropping a
//! response body must abort the underlying HTTP exchange.

use crate::error::TransportError;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, StatusCode};
use std::fmt::{Debug, Formatter};
use std::io;
use url::Url;

/// A lazily pulled response body.
pub type ResponseBody = BoxStream<'static, Result<Bytes, TransportError>>;

/// Sends HTTP requests.
///
/// Implementations own connection handling, TLS, and timeouts. The client does not retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and resolves as soon as the response head is available.
    ///
    /// A streamed request body is consumed by the transport while the request is in flight.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// The body of an [`HttpRequest`].
pub enum RequestBody {
    Empty,
    Bytes(Bytes),
    /// A body that is produced while the request is in flight.
    Stream(BoxStream<'static, Result<Bytes, io::Error>>),
}

impl Debug for RequestBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// A fully described HTTP request.
#[derive(Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

/// An HTTP response with a lazily pulled body.
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The essence of the `Content-Type` header, without parameters.
    pub fn media_type(&self) -> Option<&str> {
        let value = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let essence = value.split(';').next().unwrap_or(value).trim();
        (!essence.is_empty()).then_some(essence)
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// Reads the whole body into memory.
    pub async fn bytes(self) -> Result<Bytes, TransportError> {
        self.body
            .try_fold(BytesMut::new(), |mut buffer, chunk| async move {
                buffer.extend_from_slice(&chunk);
                Ok(buffer)
            })
            .await
            .map(BytesMut::freeze)
    }

    /// Reads the whole body into a string, replacing invalid UTF-8 sequences.
    pub async fn text(self) -> Result<String, TransportError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Debug for HttpResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// An [`HttpTransport`] backed by a [`reqwest::Client`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "reqwest")]
impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client, e.g. with timeouts or a proxy.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "reqwest")]
#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let builder = self.client.request(method, url.clone()).headers(headers);
        let builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes),
            RequestBody::Stream(stream) => builder.body(reqwest::Body::wrap_stream(stream)),
        };

        let response = builder
            .send()
            .await
            .map_err(|error| TransportError::new(format!("Could not send request to '{url}'"), error))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map_err(|error| TransportError::new("Could not read the response body", error))
            .boxed();
        Ok(HttpResponse::new(status, headers, body))
    }
}
