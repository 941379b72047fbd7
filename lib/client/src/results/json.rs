use crate::error::ParseError;
use crate::results::PushParser;
use json_event_parser::{JsonEvent, LowLevelJsonParser, LowLevelJsonParserResult};
use sparql_http_model::{BindingRow, BlankNode, Literal, NamedNode, Term};
use std::mem::take;
use tracing::trace;

/// An incremental parser for the
/// [SPARQL 1.1 Query Results JSON Format](https://www.w3.org/TR/sparql11-results-json/).
///
/// Every element of `results.bindings` is returned as soon as its closing brace has been parsed,
/// independent of how the document is split into chunks. Everything else in the document
/// (`head`, `link`, ...) is skipped.
///
/// Binding objects without any variable (`{}`) do not produce a row. Some endpoints emit them
/// for aggregates over empty groups.
///
/// ```
/// use sparql_http_client::{BindingsParser, PushParser};
/// use sparql_http_model::NamedNode;
///
/// let mut parser = BindingsParser::new();
/// let mut rows = Vec::new();
/// for chunk in [
///     r#"{"results":{"bindings":[{"a":{"type":"uri","#.as_bytes(),
///     r#""value":"http://example.org/0"}}]}}"#.as_bytes(),
/// ] {
///     parser.extend_from_slice(chunk);
///     while let Some(row) = parser.parse_next() {
///         rows.push(row?);
///     }
/// }
/// parser.end();
/// while let Some(row) = parser.parse_next() {
///     rows.push(row?);
/// }
///
/// assert!(parser.is_end());
/// assert_eq!(rows.len(), 1);
/// assert_eq!(
///     rows[0].get("a"),
///     Some(&NamedNode::new("http://example.org/0")?.into())
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct BindingsParser {
    parser: LowLevelJsonParser,
    buffer: Vec<u8>,
    position: usize,
    is_ending: bool,
    document: DocumentState,
}

impl BindingsParser {
    pub fn new() -> Self {
        Self {
            parser: LowLevelJsonParser::new(),
            buffer: Vec::new(),
            position: 0,
            is_ending: false,
            document: DocumentState::default(),
        }
    }
}

impl Default for BindingsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PushParser for BindingsParser {
    type Item = BindingRow;

    fn extend_from_slice(&mut self, chunk: &[u8]) {
        if self.position > 0 {
            self.buffer.drain(..self.position);
            self.position = 0;
        }
        self.buffer.extend_from_slice(chunk);
    }

    fn end(&mut self) {
        self.is_ending = true;
    }

    fn is_end(&self) -> bool {
        self.document.position == Position::End
    }

    fn parse_next(&mut self) -> Option<Result<BindingRow, ParseError>> {
        while !self.is_end() {
            let LowLevelJsonParserResult {
                consumed_bytes,
                event,
            } = self
                .parser
                .parse_next(&self.buffer[self.position..], self.is_ending);
            self.position += consumed_bytes;

            let Some(event) = event else {
                if consumed_bytes == 0 {
                    return None;
                }
                continue;
            };
            let result = match event {
                Ok(event) => self.document.on_event(event),
                Err(error) => Err(error.into()),
            };
            match result {
                Ok(Some(row)) => return Some(Ok(row)),
                Ok(None) => (),
                Err(error) => {
                    self.document.position = Position::End;
                    return Some(Err(error));
                }
            }
        }
        None
    }
}

/// Where the parser is in the results document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Position {
    BeforeDocument,
    /// Inside the root object.
    Document,
    BeforeResults,
    /// Inside the `results` object.
    Results,
    BeforeBindings,
    /// Inside the `bindings` array.
    Bindings,
    /// Inside a binding object.
    Row,
    /// After a variable name.
    BeforeTerm,
    /// Inside the object describing the term of a variable.
    Term,
    BeforeTermField(TermField),
    /// Inside a value that is ignored. `depth` counts the open arrays and objects.
    Skip { depth: usize, resume: Resume },
    AfterDocument,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resume {
    Document,
    Results,
    Term,
}

impl From<Resume> for Position {
    fn from(value: Resume) -> Self {
        match value {
            Resume::Document => Self::Document,
            Resume::Results => Self::Results,
            Resume::Term => Self::Term,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TermField {
    Type,
    Value,
    Datatype,
    Language,
}

/// The fields of a binding value object.
#[derive(Debug, Default)]
struct TermFields {
    kind: Option<String>,
    value: Option<String>,
    datatype: Option<String>,
    language: Option<String>,
}

impl TermFields {
    fn set(&mut self, field: TermField, value: String) {
        let slot = match field {
            TermField::Type => &mut self.kind,
            TermField::Value => &mut self.value,
            TermField::Datatype => &mut self.datatype,
            TermField::Language => &mut self.language,
        };
        *slot = Some(value);
    }

    /// Converts the fields into a term. Unknown term types become unbound values.
    fn into_term(self) -> Result<Option<Term>, ParseError> {
        let Some(kind) = self.kind else {
            return Ok(None);
        };
        let value = || {
            self.value
                .ok_or_else(|| ParseError::InvalidTerm(format!("{kind} without value")))
        };
        Ok(Some(match kind.as_str() {
            "uri" => NamedNode::new(value()?)?.into(),
            "bnode" => BlankNode::new(value()?)?.into(),
            "literal" | "typed-literal" => {
                let value = value()?;
                if let Some(datatype) = self.datatype {
                    Literal::new_typed_literal(value, NamedNode::new(datatype)?).into()
                } else if let Some(language) = self.language {
                    Literal::new_language_tagged_literal(value, language)?.into()
                } else {
                    Literal::new_simple_literal(value).into()
                }
            }
            _ => return Ok(None),
        }))
    }
}

/// The structural state machine over the JSON events of a results document.
#[derive(Debug)]
struct DocumentState {
    position: Position,
    row: BindingRow,
    variable: String,
    term: TermFields,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self {
            position: Position::BeforeDocument,
            row: BindingRow::new(),
            variable: String::new(),
            term: TermFields::default(),
        }
    }
}

impl DocumentState {
    /// Consumes one JSON event and returns a row if the event completed one.
    fn on_event(&mut self, event: JsonEvent<'_>) -> Result<Option<BindingRow>, ParseError> {
        self.position = match (self.position, event) {
            (Position::Skip { depth, resume }, event) => {
                let depth = match event {
                    JsonEvent::StartArray | JsonEvent::StartObject => depth + 1,
                    JsonEvent::EndArray | JsonEvent::EndObject => depth.saturating_sub(1),
                    JsonEvent::Eof => return Err(unexpected("the end of the document")),
                    _ => depth,
                };
                if depth == 0 {
                    resume.into()
                } else {
                    Position::Skip { depth, resume }
                }
            }
            (Position::BeforeDocument, JsonEvent::StartObject) => Position::Document,
            (Position::BeforeDocument, _) => {
                return Err(ParseError::UnexpectedDocument(
                    "the document is not a JSON object".to_owned(),
                ))
            }
            (Position::Document, JsonEvent::ObjectKey(key)) => match key.as_ref() {
                "results" => Position::BeforeResults,
                _ => skip(Resume::Document),
            },
            (Position::Document, JsonEvent::EndObject) => Position::AfterDocument,
            (Position::BeforeResults, JsonEvent::StartObject) => Position::Results,
            (Position::Results, JsonEvent::ObjectKey(key)) => match key.as_ref() {
                "bindings" => Position::BeforeBindings,
                _ => skip(Resume::Results),
            },
            (Position::Results, JsonEvent::EndObject) => Position::Document,
            (Position::BeforeBindings, JsonEvent::StartArray) => Position::Bindings,
            (Position::Bindings, JsonEvent::StartObject) => Position::Row,
            (Position::Bindings, JsonEvent::EndArray) => Position::Results,
            (Position::Row, JsonEvent::ObjectKey(variable)) => {
                self.variable = variable.into_owned();
                Position::BeforeTerm
            }
            (Position::Row, JsonEvent::EndObject) => {
                self.position = Position::Bindings;
                let row = take(&mut self.row);
                if row.is_empty() {
                    trace!("dropping empty binding object");
                    return Ok(None);
                }
                return Ok(Some(row));
            }
            (Position::BeforeTerm, JsonEvent::StartObject) => Position::Term,
            (Position::BeforeTerm, JsonEvent::Null) => {
                self.row.insert(take(&mut self.variable), None);
                Position::Row
            }
            (Position::Term, JsonEvent::ObjectKey(key)) => match key.as_ref() {
                "type" => Position::BeforeTermField(TermField::Type),
                "value" => Position::BeforeTermField(TermField::Value),
                "datatype" => Position::BeforeTermField(TermField::Datatype),
                "xml:lang" => Position::BeforeTermField(TermField::Language),
                _ => skip(Resume::Term),
            },
            (Position::Term, JsonEvent::EndObject) => {
                let term = take(&mut self.term).into_term()?;
                self.row.insert(take(&mut self.variable), term);
                Position::Row
            }
            (Position::BeforeTermField(field), JsonEvent::String(value)) => {
                self.term.set(field, value.into_owned());
                Position::Term
            }
            (Position::BeforeTermField(_), JsonEvent::StartArray | JsonEvent::StartObject) => {
                Position::Skip {
                    depth: 1,
                    resume: Resume::Term,
                }
            }
            (
                Position::BeforeTermField(_),
                JsonEvent::Number(_) | JsonEvent::Boolean(_) | JsonEvent::Null,
            ) => Position::Term,
            (Position::AfterDocument, JsonEvent::Eof) => Position::End,
            (Position::End, _) => Position::End,
            (Position::BeforeResults, _) => return Err(unexpected("a non-object 'results'")),
            (Position::BeforeBindings, _) => return Err(unexpected("a non-array 'bindings'")),
            (Position::Bindings, _) => return Err(unexpected("a binding that is not an object")),
            (Position::BeforeTerm, _) => {
                return Err(unexpected("a variable value that is not an object"))
            }
            (_, JsonEvent::Eof) => return Err(unexpected("the end of the document")),
            (position, event) => {
                return Err(ParseError::UnexpectedDocument(format!(
                    "unexpected {event:?} in {position:?}"
                )))
            }
        };
        Ok(None)
    }
}

fn skip(resume: Resume) -> Position {
    Position::Skip { depth: 0, resume }
}

fn unexpected(found: &str) -> ParseError {
    ParseError::UnexpectedDocument(format!("found {found}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::non_ascii_literal)]
    const DOCUMENT: &str = r#"{
  "head": { "vars": ["s", "label", "count", "missing", "blank", "weird"], "link": [] },
  "results": {
    "distinct": false,
    "bindings": [
      {
        "s": { "type": "uri", "value": "http://example.org/sé" },
        "label": { "type": "literal", "value": "café \"x\"", "xml:lang": "fr" },
        "count": { "type": "typed-literal", "value": "42", "datatype": "http://www.w3.org/2001/XMLSchema#integer" }
      },
      {},
      {
        "blank": { "type": "bnode", "value": "b0" },
        "weird": { "type": "triple", "value": { "subject": { "type": "uri", "value": "http://example.org/a" } } },
        "label": { "type": "literal", "value": "plain" }
      }
    ]
  }
}"#;

    fn parse_chunks<'a>(
        chunks: impl IntoIterator<Item = &'a [u8]>,
    ) -> Result<Vec<BindingRow>, ParseError> {
        let mut parser = BindingsParser::new();
        let mut rows = Vec::new();
        for chunk in chunks {
            parser.extend_from_slice(chunk);
            while let Some(row) = parser.parse_next() {
                rows.push(row?);
            }
        }
        parser.end();
        while let Some(row) = parser.parse_next() {
            rows.push(row?);
        }
        assert!(parser.is_end());
        Ok(rows)
    }

    fn parse(document: &str) -> Result<Vec<BindingRow>, ParseError> {
        parse_chunks([document.as_bytes()])
    }

    #[test]
    fn parses_single_uri_binding() {
        let rows =
            parse(r#"{"results":{"bindings":[{"a":{"type":"uri","value":"http://example.org/0"}}]}}"#)
                .unwrap();

        let expected: BindingRow = [(
            "a".to_owned(),
            Some(NamedNode::new_unchecked("http://example.org/0").into()),
        )]
        .into_iter()
        .collect();
        assert_eq!(rows, vec![expected]);
    }

    #[test]
    fn converts_all_term_types() {
        let rows = parse(DOCUMENT).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("s"),
            Some(&NamedNode::new_unchecked("http://example.org/s\u{e9}").into())
        );
        assert_eq!(
            rows[0].get("label"),
            Some(&Literal::new_language_tagged_literal_unchecked("caf\u{e9} \"x\"", "fr").into())
        );
        assert_eq!(
            rows[0].get("count"),
            Some(
                &Literal::new_typed_literal(
                    "42",
                    NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#integer")
                )
                .into()
            )
        );
        assert_eq!(
            rows[1].get("blank"),
            Some(&BlankNode::new_unchecked("b0").into())
        );
        assert!(rows[1].contains("weird"));
        assert_eq!(rows[1].get("weird"), None);
        assert_eq!(
            rows[1].get("label"),
            Some(&Literal::new_simple_literal("plain").into())
        );
    }

    #[test]
    fn variable_order_follows_the_document() {
        let rows = parse(DOCUMENT).unwrap();

        assert_eq!(
            rows[0].variables().collect::<Vec<_>>(),
            vec!["s", "label", "count"]
        );
    }

    #[test]
    fn drops_empty_binding_objects() {
        let rows = parse(
            r#"{"results":{"bindings":[{},{"a":{"type":"literal","value":"1"}},{},{"a":{"type":"literal","value":"2"}}]}}"#,
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("a"), Some(&Literal::new_simple_literal("1").into()));
        assert_eq!(rows[1].get("a"), Some(&Literal::new_simple_literal("2").into()));
    }

    #[test]
    fn result_does_not_depend_on_chunk_boundaries() {
        let expected = parse(DOCUMENT).unwrap();
        let bytes = DOCUMENT.as_bytes();

        let single_bytes = parse_chunks(bytes.chunks(1)).unwrap();
        assert_eq!(single_bytes, expected);

        for split in 0..=bytes.len() {
            let (first, second) = bytes.split_at(split);
            assert_eq!(parse_chunks([first, second]).unwrap(), expected, "split at {split}");
        }

        for size in [2, 3, 7, 16, 100] {
            assert_eq!(parse_chunks(bytes.chunks(size)).unwrap(), expected, "chunks of {size}");
        }
    }

    #[test]
    fn emits_rows_before_the_end_of_the_document() {
        let mut parser = BindingsParser::new();
        parser.extend_from_slice(
            br#"{"results":{"bindings":[{"a":{"type":"uri","value":"http://example.org/0"}},"#,
        );

        let row = parser.parse_next().unwrap().unwrap();
        assert_eq!(
            row.get("a"),
            Some(&NamedNode::new_unchecked("http://example.org/0").into())
        );
        assert!(parser.parse_next().is_none());
        assert!(!parser.is_end());
    }

    #[test]
    fn bindings_after_head_and_before_it_are_found() {
        let rows = parse(
            r#"{"results":{"bindings":[{"x":{"type":"literal","value":"v"}}]},"head":{"vars":["x"]}}"#,
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn boolean_document_has_no_rows() {
        assert_eq!(parse(r#"{"head":{},"boolean":true}"#).unwrap(), vec![]);
    }

    #[test]
    fn unknown_term_type_is_unbound() {
        let rows =
            parse(r#"{"results":{"bindings":[{"a":{"type":"unknown","value":"x"}}]}}"#).unwrap();

        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("a"));
        assert_eq!(rows[0].get("a"), None);
    }

    #[test]
    fn invalid_json_fails() {
        assert!(matches!(
            parse(r#"{"results":{"bindings":[{"a":"#),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(parse("not json"), Err(ParseError::Json(_))));
    }

    #[test]
    fn non_object_document_fails() {
        assert!(matches!(
            parse("[1, 2]"),
            Err(ParseError::UnexpectedDocument(_))
        ));
    }

    #[test]
    fn invalid_iri_fails() {
        assert!(matches!(
            parse(r#"{"results":{"bindings":[{"a":{"type":"uri","value":"not an iri"}}]}}"#),
            Err(ParseError::InvalidTerm(_))
        ));
    }

    #[test]
    fn parser_stops_after_an_error() {
        let mut parser = BindingsParser::new();
        parser.extend_from_slice(br#"{"results":{"bindings":[{"a":{"type":"uri","value":"::"}}, {"#);

        assert!(matches!(parser.parse_next(), Some(Err(_))));
        assert!(parser.parse_next().is_none());
        assert!(parser.is_end());
    }
}
