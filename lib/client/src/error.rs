use http::StatusCode;
use json_event_parser::JsonSyntaxError;
use oxttl::TurtleSyntaxError;
use sparql_http_model::{BlankNodeIdParseError, IriParseError, LanguageTagParseError};
use std::convert::Infallible;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

/// Any error raised by the client.
///
/// Every variant corresponds to one failure class. None of them is retried by the client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SparqlClientError {
    /// The request could not be built from the configuration and the call arguments.
    #[error(transparent)]
    RequestBuild(#[from] RequestBuildError),
    /// No HTTP response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The endpoint answered with a non-2xx status.
    #[error(transparent)]
    Server(#[from] ServerError),
    /// The response body does not conform to the expected format.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The client was constructed with an unusable configuration.
    #[error(transparent)]
    Contract(#[from] ContractError),
    /// The quads handed to a graph store write failed.
    #[error("The quad source failed: {0}")]
    Source(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl SparqlClientError {
    /// Wraps an error of a caller-provided quad source.
    pub fn from_source(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Source(error.into())
    }

    /// The HTTP status if the error was caused by an unsuccessful response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Server(error) => Some(error.status()),
            _ => None,
        }
    }
}

impl From<Infallible> for SparqlClientError {
    fn from(error: Infallible) -> Self {
        match error {}
    }
}

impl From<SparqlClientError> for io::Error {
    #[inline]
    fn from(error: SparqlClientError) -> Self {
        match error {
            SparqlClientError::Transport(error) => Self::other(error),
            SparqlClientError::Parse(error) => Self::new(io::ErrorKind::InvalidData, error),
            SparqlClientError::RequestBuild(error) => {
                Self::new(io::ErrorKind::InvalidInput, error)
            }
            SparqlClientError::Contract(error) => Self::new(io::ErrorKind::InvalidInput, error),
            error @ (SparqlClientError::Server(_) | SparqlClientError::Source(_)) => {
                Self::other(error)
            }
        }
    }
}

/// The request for a call could not be built.
#[derive(Debug, thiserror::Error)]
pub enum RequestBuildError {
    /// The endpoint has no URL configured for the requested kind of operation.
    #[error("No {0} URL is configured for this endpoint")]
    MissingUrl(&'static str),
    /// Blank node graph names can not be addressed through the Graph Store Protocol.
    #[error("The graph {0} is a blank node and can not be addressed in the graph store")]
    BlankNodeGraph(String),
}

/// No HTTP response was received, e.g. because the connection failed.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl TransportError {
    /// Builds an error from a printable error message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error from a message and its cause.
    pub fn new(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// The endpoint answered with a non-2xx status.
///
/// The body of the response is kept verbatim.
#[derive(Debug, thiserror::Error)]
pub struct ServerError {
    status: StatusCode,
    body: String,
}

impl ServerError {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The text of the response body.
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let reason = self.status.canonical_reason().unwrap_or("Unknown Status");
        write!(f, "{reason} ({}): {}", self.status.as_u16(), self.body)
    }
}

/// The response body does not conform to the expected format.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The SPARQL results document is not valid JSON.
    #[error(transparent)]
    Json(#[from] JsonSyntaxError),
    /// The RDF document is not valid N-Triples or Turtle.
    #[error(transparent)]
    Rdf(#[from] TurtleSyntaxError),
    /// A binding value could not be converted into an RDF term.
    #[error("Invalid term in SPARQL results: {0}")]
    InvalidTerm(String),
    /// The JSON document is valid but does not have the expected structure.
    #[error("Unexpected SPARQL results document: {0}")]
    UnexpectedDocument(String),
    /// The response has a media type that the client can not parse.
    #[error("Unsupported response media type '{0}'")]
    UnsupportedFormat(String),
    /// The ASK response is not a SPARQL boolean result.
    #[error("Invalid SPARQL boolean result: {0}")]
    InvalidAsk(#[source] serde_json::Error),
}

impl From<IriParseError> for ParseError {
    fn from(error: IriParseError) -> Self {
        Self::InvalidTerm(error.to_string())
    }
}

impl From<BlankNodeIdParseError> for ParseError {
    fn from(error: BlankNodeIdParseError) -> Self {
        Self::InvalidTerm(error.to_string())
    }
}

impl From<LanguageTagParseError> for ParseError {
    fn from(error: LanguageTagParseError) -> Self {
        Self::InvalidTerm(error.to_string())
    }
}

/// The client was constructed with a configuration it can not work with.
///
/// Raised eagerly while constructing an [`Endpoint`](crate::Endpoint) or a client, before any
/// request is sent.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// None of the query, update, and store URLs is set.
    #[error("At least one of the query, update, or store URL must be configured")]
    NoEndpointUrl,
    /// A configured URL could not be parsed.
    #[error("Invalid {kind} URL '{url}': {error}")]
    InvalidUrl {
        kind: &'static str,
        url: String,
        #[source]
        error: url::ParseError,
    },
    /// A configured header name or value is invalid.
    #[error("Invalid HTTP header '{0}'")]
    InvalidHeader(String),
    /// A partition must hold at least one quad.
    #[error("The maximum number of quads per request must be greater than zero")]
    ZeroQuadsPerRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_message_contains_status_and_body() {
        let error = ServerError::new(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        let message = error.to_string();

        assert_eq!(message, "Internal Server Error (500): boom");
    }

    #[test]
    fn status_is_only_available_for_server_errors() {
        let server: SparqlClientError = ServerError::new(StatusCode::NOT_FOUND, "").into();
        let transport: SparqlClientError = TransportError::msg("connection refused").into();

        assert_eq!(server.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(transport.status(), None);
    }
}
