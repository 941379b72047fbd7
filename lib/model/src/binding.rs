use oxrdf::Term;
use std::fmt::{Display, Formatter};

/// A single solution of a SPARQL SELECT query.
///
/// Maps variable names to the term bound to them. The order of the variables is the order in
/// which the endpoint sent them. A variable can be present but unbound (`None`).
///
/// ```
/// use sparql_http_model::{BindingRow, NamedNode, Term};
///
/// let mut row = BindingRow::new();
/// row.insert("s", Some(NamedNode::new_unchecked("http://example.org/s").into()));
/// row.insert("o", None);
///
/// assert_eq!(
///     row.get("s"),
///     Some(&Term::from(NamedNode::new_unchecked("http://example.org/s")))
/// );
/// assert_eq!(row.get("o"), None);
/// assert!(row.contains("o"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingRow {
    bindings: Vec<(String, Option<Term>)>,
}

impl BindingRow {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `variable` to `term`.
    ///
    /// Variable names are unique within a row. If `variable` is already present, its value is
    /// replaced in place and the previous value is returned.
    pub fn insert(
        &mut self,
        variable: impl Into<String>,
        term: Option<Term>,
    ) -> Option<Option<Term>> {
        let variable = variable.into();
        match self.bindings.iter_mut().find(|(name, _)| *name == variable) {
            Some((_, value)) => Some(std::mem::replace(value, term)),
            None => {
                self.bindings.push((variable, term));
                None
            }
        }
    }

    /// Returns the term bound to `variable`.
    ///
    /// Returns `None` if the variable is not part of the row or if it is unbound.
    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.bindings
            .iter()
            .find(|(name, _)| name == variable)
            .and_then(|(_, term)| term.as_ref())
    }

    /// Whether `variable` is part of this row, bound or not.
    pub fn contains(&self, variable: &str) -> bool {
        self.bindings.iter().any(|(name, _)| name == variable)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The variables of this row in order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over all `(variable, term)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Term>)> {
        self.bindings
            .iter()
            .map(|(name, term)| (name.as_str(), term.as_ref()))
    }
}

impl FromIterator<(String, Option<Term>)> for BindingRow {
    fn from_iter<T: IntoIterator<Item = (String, Option<Term>)>>(iter: T) -> Self {
        let mut row = Self::new();
        for (variable, term) in iter {
            row.insert(variable, term);
        }
        row
    }
}

impl IntoIterator for BindingRow {
    type Item = (String, Option<Term>);
    type IntoIter = std::vec::IntoIter<(String, Option<Term>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.into_iter()
    }
}

impl Display for BindingRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (name, term)) in self.bindings.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match term {
                Some(term) => write!(f, "?{name}: {term}")?,
                None => write!(f, "?{name}: UNDEF")?,
            }
        }
        f.write_str("}")
    }
}
