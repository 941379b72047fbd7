pub use oxrdf::vocab::{rdf, xsd};

/// Media types exchanged with SPARQL and Graph Store endpoints.
pub mod media_type {
    /// [SPARQL 1.1 Query Results JSON Format](https://www.w3.org/TR/sparql11-results-json/).
    pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
    /// [N-Triples](https://www.w3.org/TR/n-triples/).
    pub const N_TRIPLES: &str = "application/n-triples";
    /// [Turtle](https://www.w3.org/TR/turtle/).
    pub const TURTLE: &str = "text/turtle";
    /// A query sent as the body of a POST request.
    pub const SPARQL_QUERY_UTF8: &str = "application/sparql-query; charset=utf-8";
    /// A query or update sent as an HTML form.
    pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
    /// Accepts everything.
    pub const ANY: &str = "*/*";
}
