mod binding;
pub mod vocab;

pub use binding::BindingRow;

// Re-export some oxrdf types.
pub use oxrdf::{
    BlankNode, BlankNodeIdParseError, BlankNodeRef, Dataset, Graph, GraphName, GraphNameRef,
    IriParseError, LanguageTagParseError, Literal, LiteralRef, NamedNode, NamedNodeRef,
    NamedOrBlankNode, Quad, QuadRef, Subject, SubjectRef, Term, TermRef, Triple, TripleRef,
};
