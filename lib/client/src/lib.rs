#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod client;
mod config;
mod endpoint;
mod error;
mod query;
mod request;
mod response;
mod results;
mod store;
#[cfg(test)]
mod test_util;
mod transport;

pub use client::{Client, ParsingClient, SimpleClient, StreamClient};
pub use config::{DefaultGraphSelector, EndpointConfig, WRITE_BODY_CHANNEL_CAPACITY};
pub use endpoint::Endpoint;
pub use error::{
    ContractError, ParseError, RequestBuildError, ServerError, SparqlClientError, TransportError,
};
pub use query::{ParsingQuery, QueryExecutor, RawQuery, StreamQuery};
pub use request::{Operation, QueryForm, RequestBuilder, RequestOptions};
pub use results::{BindingStream, BindingsParser, PushParser, QuadStream};
pub use store::{GraphStore, WriteOptions};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, RequestBody, ResponseBody};

pub mod model {
    pub use sparql_http_model::*;
}
