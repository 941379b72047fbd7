use crate::error::{ParseError, ServerError, SparqlClientError};
use crate::transport::HttpResponse;
use serde::Deserialize;
use tracing::warn;

/// Turns a non-2xx response into a [`ServerError`] carrying the body text.
///
/// The body is left empty if it can not be read.
pub(crate) async fn check_response(
    response: HttpResponse,
) -> Result<HttpResponse, SparqlClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), body = %body, "endpoint answered with an error");
    Err(ServerError::new(status, body).into())
}

#[derive(Deserialize)]
struct BooleanResult {
    boolean: bool,
}

/// Reads the `boolean` field of a SPARQL JSON boolean result.
pub(crate) async fn parse_ask(response: HttpResponse) -> Result<bool, SparqlClientError> {
    let body = response.bytes().await?;
    let result: BooleanResult = serde_json::from_slice(&body).map_err(ParseError::InvalidAsk)?;
    Ok(result.boolean)
}
