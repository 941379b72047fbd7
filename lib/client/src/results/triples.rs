use crate::error::ParseError;
use crate::results::PushParser;
use oxrdfio::RdfFormat;
use oxttl::ntriples::LowLevelNTriplesParser;
use oxttl::turtle::LowLevelTurtleParser;
use oxttl::{NTriplesParser, TurtleParser};
use sparql_http_model::{GraphName, Quad};

/// Parses the triples of a CONSTRUCT or graph store response and puts them into a graph.
///
/// The syntax is picked from the media type of the response. N-Triples is assumed if the
/// response has none.
pub(crate) struct QuadParser {
    syntax: TriplesSyntax,
    graph_name: GraphName,
}

enum TriplesSyntax {
    NTriples(LowLevelNTriplesParser),
    Turtle(LowLevelTurtleParser),
    /// The error is only reported once the first element is requested.
    Unsupported { media_type: String, reported: bool },
}

impl QuadParser {
    pub(crate) fn new(media_type: Option<&str>, graph_name: GraphName) -> Self {
        let format = media_type.map_or(Some(RdfFormat::NTriples), RdfFormat::from_media_type);
        let syntax = match format {
            Some(RdfFormat::NTriples) => TriplesSyntax::NTriples(NTriplesParser::new().low_level()),
            Some(RdfFormat::Turtle) => TriplesSyntax::Turtle(TurtleParser::new().low_level()),
            _ => TriplesSyntax::Unsupported {
                media_type: media_type.unwrap_or_default().to_owned(),
                reported: false,
            },
        };
        Self { syntax, graph_name }
    }
}

impl PushParser for QuadParser {
    type Item = Quad;

    fn extend_from_slice(&mut self, chunk: &[u8]) {
        match &mut self.syntax {
            TriplesSyntax::NTriples(parser) => parser.extend_from_slice(chunk),
            TriplesSyntax::Turtle(parser) => parser.extend_from_slice(chunk),
            TriplesSyntax::Unsupported { .. } => (),
        }
    }

    fn end(&mut self) {
        match &mut self.syntax {
            TriplesSyntax::NTriples(parser) => parser.end(),
            TriplesSyntax::Turtle(parser) => parser.end(),
            TriplesSyntax::Unsupported { .. } => (),
        }
    }

    fn is_end(&self) -> bool {
        match &self.syntax {
            TriplesSyntax::NTriples(parser) => parser.is_end(),
            TriplesSyntax::Turtle(parser) => parser.is_end(),
            TriplesSyntax::Unsupported { reported, .. } => *reported,
        }
    }

    fn parse_next(&mut self) -> Option<Result<Quad, ParseError>> {
        let triple = match &mut self.syntax {
            TriplesSyntax::NTriples(parser) => parser.parse_next()?,
            TriplesSyntax::Turtle(parser) => parser.parse_next()?,
            TriplesSyntax::Unsupported {
                media_type,
                reported,
            } => {
                if *reported {
                    return None;
                }
                *reported = true;
                return Some(Err(ParseError::UnsupportedFormat(media_type.clone())));
            }
        };
        Some(
            triple
                .map(|triple| triple.in_graph(self.graph_name.clone()))
                .map_err(ParseError::from),
        )
    }
}
