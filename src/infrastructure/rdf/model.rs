//! Parsed RDF graph with the typed query helpers used by offering resolution.
//!
//! URIs travel in their delimited SPARQL form (`<http://...>`): that is what
//! [`RdfModel::object_uris`] and [`RdfModel::query_uris`] return and what the
//! `subject` argument of every helper expects. Use [`strip_delimiters`] to get
//! the bare URI.
//!
//! SPARQL solutions come back in store index order. The helpers re-sort them
//! by the position where each term first appears in the parsed document, so
//! callers see document order.

use std::collections::HashMap;
use std::fmt;

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{Subject, Term};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;

use super::vocabulary::{RDFS_LABEL, with_prefixes};

/// Errors raised while parsing or querying an RDF document.
#[derive(Debug, thiserror::Error)]
pub enum RdfError {
    #[error("RDF document could not be parsed: {0}")]
    Parse(String),

    #[error("SPARQL query failed: {0}")]
    Query(String),

    #[error("RDF store error: {0}")]
    Storage(String),
}

/// An in-memory RDF graph.
pub struct RdfModel {
    store: Store,
    /// First position of each subject or object term, keyed by its SPARQL form.
    order: HashMap<String, usize>,
}

impl fmt::Debug for RdfModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RdfModel")
            .field("triples", &self.store.len().unwrap_or(0))
            .finish()
    }
}

impl RdfModel {
    /// Parses `data` in the given syntax into a fresh in-memory graph.
    ///
    /// # Errors
    ///
    /// Returns [`RdfError::Parse`] if the document is not valid in `format`
    /// or `base_iri` is not an IRI.
    pub fn parse(data: &[u8], format: RdfFormat, base_iri: Option<&str>) -> Result<Self, RdfError> {
        let store = Store::new().map_err(|e| RdfError::Storage(e.to_string()))?;

        let mut parser = RdfParser::from_format(format);
        if let Some(base) = base_iri {
            parser = parser
                .with_base_iri(base)
                .map_err(|e| RdfError::Parse(e.to_string()))?;
        }

        let mut order = HashMap::new();
        for quad in parser.for_reader(data) {
            let quad = quad.map_err(|e| RdfError::Parse(e.to_string()))?;

            let subject = match &quad.subject {
                Subject::NamedNode(node) => Some(node.to_string()),
                Subject::BlankNode(node) => Some(node.to_string()),
                _ => None,
            };
            for key in subject.into_iter().chain(term_key(&quad.object)) {
                let next = order.len();
                order.entry(key).or_insert(next);
            }

            store
                .insert(&quad)
                .map_err(|e| RdfError::Storage(e.to_string()))?;
        }

        Ok(Self { store, order })
    }

    /// Document position of a delimited URI or blank node, if it occurs.
    pub fn position(&self, term: &str) -> Option<usize> {
        self.order.get(term).copied()
    }

    fn sort_by_position(&self, terms: &mut [String]) {
        terms.sort_by_key(|t| self.position(t).unwrap_or(usize::MAX));
    }

    /// Number of triples in the graph.
    pub fn len(&self) -> usize {
        self.store.len().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every URI object of `subject predicate ?o`, delimited.
    pub fn object_uris(&self, subject: &str, predicate: &str) -> Result<Vec<String>, RdfError> {
        let query = format!("SELECT ?o WHERE {{ {subject} {predicate} ?o . FILTER(isIRI(?o)) }}");
        self.query_uris(&with_prefixes(&query), "o")
    }

    /// Returns the first URI object of `subject predicate ?o`, delimited.
    pub fn object_uri(&self, subject: &str, predicate: &str) -> Result<Option<String>, RdfError> {
        Ok(self.object_uris(subject, predicate)?.into_iter().next())
    }

    /// Returns the lexical value of the first literal object, if any.
    pub fn literal(&self, subject: &str, predicate: &str) -> Result<Option<String>, RdfError> {
        let query = format!(
            "SELECT ?o WHERE {{ {subject} {predicate} ?o . FILTER(isLiteral(?o)) }} LIMIT 1"
        );
        let terms = self.select(&with_prefixes(&query), "o")?;

        Ok(terms.into_iter().find_map(|term| match term {
            Term::Literal(literal) => Some(literal.value().to_string()),
            _ => None,
        }))
    }

    /// Returns the `rdfs:label` of every blank node reached through
    /// `subject predicate _:node`.
    pub fn blank_node_labels(&self, subject: &str, predicate: &str) -> Result<Vec<String>, RdfError> {
        let query = format!(
            "SELECT ?node ?label WHERE {{ {subject} {predicate} ?node . FILTER(isBlank(?node)) \
             ?node {RDFS_LABEL} ?label . }}"
        );
        let rows = self.select_rows(&with_prefixes(&query), &["node", "label"])?;

        let mut labels: Vec<(usize, String)> = rows
            .into_iter()
            .filter_map(|row| match row.as_slice() {
                [Some(node), Some(Term::Literal(label))] => Some((
                    term_key(node)
                        .and_then(|key| self.position(&key))
                        .unwrap_or(usize::MAX),
                    label.value().to_string(),
                )),
                _ => None,
            })
            .collect();
        labels.sort_by_key(|(position, _)| *position);

        Ok(labels.into_iter().map(|(_, label)| label).collect())
    }

    /// Runs a SELECT query and returns the URIs bound to `variable`, delimited,
    /// in document order without repeats.
    ///
    /// Solutions where the variable is unbound or not a URI are skipped.
    pub fn query_uris(&self, query: &str, variable: &str) -> Result<Vec<String>, RdfError> {
        let terms = self.select(query, variable)?;

        let mut uris: Vec<String> = Vec::with_capacity(terms.len());
        for term in terms {
            if let Term::NamedNode(node) = term {
                let uri = node.to_string();
                if !uris.contains(&uri) {
                    uris.push(uri);
                }
            }
        }
        self.sort_by_position(&mut uris);

        Ok(uris)
    }

    fn select(&self, query: &str, variable: &str) -> Result<Vec<Term>, RdfError> {
        Ok(self
            .select_rows(query, &[variable])?
            .into_iter()
            .filter_map(|mut row| row.pop().flatten())
            .collect())
    }

    fn select_rows(&self, query: &str, variables: &[&str]) -> Result<Vec<Vec<Option<Term>>>, RdfError> {
        let results = self
            .store
            .query(query)
            .map_err(|e| RdfError::Query(e.to_string()))?;

        let QueryResults::Solutions(solutions) = results else {
            return Err(RdfError::Query("expected a SELECT query".to_string()));
        };

        let mut rows = Vec::new();
        for solution in solutions {
            let solution = solution.map_err(|e| RdfError::Query(e.to_string()))?;
            rows.push(
                variables
                    .iter()
                    .map(|variable| solution.get(*variable).cloned())
                    .collect(),
            );
        }

        Ok(rows)
    }
}

fn term_key(term: &Term) -> Option<String> {
    match term {
        Term::NamedNode(node) => Some(node.to_string()),
        Term::BlankNode(node) => Some(node.to_string()),
        _ => None,
    }
}

/// Removes the `<` `>` delimiters around a URI, if present.
pub fn strip_delimiters(uri: &str) -> &str {
    uri.strip_prefix('<')
        .and_then(|u| u.strip_suffix('>'))
        .unwrap_or(uri)
}

/// Wraps a bare URI in `<` `>` delimiters.
pub fn delimit(uri: &str) -> String {
    format!("<{}>", strip_delimiters(uri))
}
