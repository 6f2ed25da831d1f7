//! Path queries over JSON documents.
//!
//! A query is a dot-separated list of steps applied left to right to a set of
//! JSON values, starting from the document root:
//!
//! - `*` expands every element of an array or every value of an object
//! - a non-negative integer selects that (zero-based) array element
//! - any other step selects the object member with that name
//!
//! Steps that do not apply to a value (a key on an array, an index past the
//! end) drop it from the set, so a query never fails on shape alone.
//!
//! ```
//! use iiif_timer::query::JsonQuery;
//! use serde_json::json;
//!
//! let doc = json!({"sequences": [{"canvases": [{"label": "a"}, {"label": "b"}]}]});
//! let labels = JsonQuery::parse("sequences.*.canvases.*.label")
//!     .unwrap()
//!     .list(&doc)
//!     .unwrap();
//! assert_eq!(labels, vec!["a", "b"]);
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

/// Errors produced by parsing or evaluating a query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The query text is empty or has an empty step.
    #[error("invalid query '{query}': empty step")]
    EmptyStep { query: String },

    /// No value matched where exactly one was required.
    #[error("query '{query}' matched nothing")]
    NoMatch { query: String },

    /// More than one value matched where exactly one was required.
    #[error("query '{query}' matched {count} values, expected one")]
    Ambiguous { query: String, count: usize },

    /// A matched value is not a string or number.
    #[error("query '{query}' matched a non-scalar value")]
    NotScalar { query: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Wildcard,
    Index(usize),
    Key(String),
}

/// A parsed JSON path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonQuery {
    text: String,
    steps: Vec<Step>,
}

impl JsonQuery {
    /// Parses a dot-separated query.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyStep`] for an empty query or an empty step
    /// (such as `a..b`).
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let steps = text
            .split('.')
            .map(|step| match step {
                "" => Err(QueryError::EmptyStep {
                    query: text.to_string(),
                }),
                "*" => Ok(Step::Wildcard),
                _ => Ok(step
                    .parse::<usize>()
                    .map_or_else(|_| Step::Key(step.to_string()), Step::Index)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            text: text.to_string(),
            steps,
        })
    }

    /// Returns every value the query reaches, in document order.
    #[must_use]
    pub fn select<'a>(&self, doc: &'a Value) -> Vec<&'a Value> {
        self.steps.iter().fold(vec![doc], |current, step| {
            current
                .into_iter()
                .flat_map(|value| apply(step, value))
                .collect()
        })
    }

    /// Returns the matched scalars as strings, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NotScalar`] if any match is an array, object,
    /// boolean or null.
    pub fn list(&self, doc: &Value) -> Result<Vec<String>, QueryError> {
        self.select(doc)
            .into_iter()
            .map(|value| scalar_text(value).ok_or_else(|| self.not_scalar()))
            .collect()
    }

    /// Returns the single matched scalar as a string.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoMatch`] or [`QueryError::Ambiguous`] unless
    /// exactly one value matches, and [`QueryError::NotScalar`] if it is not
    /// a string or number.
    pub fn value(&self, doc: &Value) -> Result<String, QueryError> {
        match self.select(doc).as_slice() {
            [] => Err(QueryError::NoMatch {
                query: self.text.clone(),
            }),
            [single] => scalar_text(single).ok_or_else(|| self.not_scalar()),
            many => Err(QueryError::Ambiguous {
                query: self.text.clone(),
                count: many.len(),
            }),
        }
    }

    fn not_scalar(&self) -> QueryError {
        QueryError::NotScalar {
            query: self.text.clone(),
        }
    }
}

impl FromStr for JsonQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for JsonQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn apply<'a>(step: &Step, value: &'a Value) -> Vec<&'a Value> {
    match (step, value) {
        (Step::Wildcard, Value::Array(items)) => items.iter().collect(),
        (Step::Wildcard, Value::Object(members)) => members.values().collect(),
        (Step::Index(index), Value::Array(items)) => items.get(*index).into_iter().collect(),
        (Step::Key(key), Value::Object(members)) => members.get(key).into_iter().collect(),
        // Numeric object keys ("0", "1") are still keys
        (Step::Index(index), Value::Object(members)) => {
            members.get(&index.to_string()).into_iter().collect()
        }
        _ => Vec::new(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Runs `query` against `doc` and returns the matched strings.
///
/// # Errors
///
/// Returns any parse or evaluation error of [`JsonQuery::list`].
pub fn get_list(doc: &Value, query: &str) -> Result<Vec<String>, QueryError> {
    JsonQuery::parse(query)?.list(doc)
}

/// Runs `query` against `doc` and returns the single matched scalar.
///
/// # Errors
///
/// Returns any parse or evaluation error of [`JsonQuery::value`].
pub fn get_value(doc: &Value, query: &str) -> Result<String, QueryError> {
    JsonQuery::parse(query)?.value(doc)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn manifest() -> Value {
        json!({
            "sequences": [{
                "canvases": [
                    {"thumbnail": "https://example.org/t/1.jpg", "width": 4000},
                    {"thumbnail": "https://example.org/t/2.jpg", "width": 3000.0}
                ]
            }]
        })
    }

    #[test]
    fn test_parse_rejects_empty_steps() {
        assert!(matches!(
            JsonQuery::parse(""),
            Err(QueryError::EmptyStep { .. })
        ));
        assert!(matches!(
            JsonQuery::parse("a..b"),
            Err(QueryError::EmptyStep { .. })
        ));
    }

    #[test]
    fn test_wildcards_keep_document_order() {
        let urls = get_list(&manifest(), "sequences.*.canvases.*.thumbnail").unwrap();
        assert_eq!(
            urls,
            vec!["https://example.org/t/1.jpg", "https://example.org/t/2.jpg"]
        );
    }

    #[test]
    fn test_index_selects_zero_based_element() {
        let url = get_value(&manifest(), "sequences.0.canvases.1.thumbnail").unwrap();
        assert_eq!(url, "https://example.org/t/2.jpg");
    }

    #[test]
    fn test_numbers_render_as_text() {
        assert_eq!(
            get_value(&manifest(), "sequences.0.canvases.0.width").unwrap(),
            "4000"
        );
        assert_eq!(
            get_value(&manifest(), "sequences.0.canvases.1.width").unwrap(),
            "3000.0"
        );
    }

    #[test]
    fn test_value_requires_exactly_one_match() {
        assert!(matches!(
            get_value(&manifest(), "sequences.0.canvases.9.thumbnail"),
            Err(QueryError::NoMatch { .. })
        ));
        assert!(matches!(
            get_value(&manifest(), "sequences.*.canvases.*.thumbnail"),
            Err(QueryError::Ambiguous { count: 2, .. })
        ));
    }

    #[test]
    fn test_list_rejects_non_scalars() {
        assert!(matches!(
            get_list(&manifest(), "sequences.*.canvases"),
            Err(QueryError::NotScalar { .. })
        ));
    }

    #[test]
    fn test_key_with_at_sign() {
        let doc = json!({"service": {"@id": "https://example.org/iiif/a"}});
        assert_eq!(
            get_value(&doc, "service.@id").unwrap(),
            "https://example.org/iiif/a"
        );
    }

    #[test]
    fn test_mismatched_steps_drop_values() {
        let doc = json!({"a": [1, 2], "b": {"c": 3}});
        assert!(JsonQuery::parse("a.c").unwrap().select(&doc).is_empty());
        assert!(JsonQuery::parse("b.5").unwrap().select(&doc).is_empty());
        assert_eq!(get_list(&doc, "a.*").unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn test_display_round_trips_text() {
        let query: JsonQuery = "sequences.*.canvases".parse().unwrap();
        assert_eq!(query.to_string(), "sequences.*.canvases");
    }
}
