//! Document query filters.
//!
//! A [`Filter`] is a conjunction of clauses evaluated against the JSON form
//! of a document, addressing top-level camelCase fields the way a document
//! database query would (`{isActive: true, doctorId: ...}`).

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Field holding the soft-delete flag on every document.
pub const IS_ACTIVE: &str = "isActive";

/// Field holding the document id.
pub const ID: &str = "id";

/// A single predicate over one field (or a disjunction of filters).
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Field equals value. `Null` also matches a missing field.
    Eq { field: String, value: Value },
    /// Field equals one of the values.
    In { field: String, values: Vec<Value> },
    /// RFC 3339 timestamp field lies within the inclusive bounds.
    Between {
        field: String,
        gte: Option<DateTime<Utc>>,
        lte: Option<DateTime<Utc>>,
    },
    /// String field contains the needle, ignoring case.
    Contains { field: String, needle: String },
    /// At least one of the filters matches.
    Or(Vec<Filter>),
}

/// Conjunction of clauses. The empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only documents that have not been soft-deleted.
    pub fn active() -> Self {
        Self::new().eq(IS_ACTIVE, true)
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    /// Add an equality clause only when a value is present.
    pub fn eq_opt<V: Into<Value>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn any_of<V: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.clauses.push(Clause::In {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Add a timestamp range clause; no-op when both bounds are open.
    pub fn between(
        mut self,
        field: &str,
        gte: Option<DateTime<Utc>>,
        lte: Option<DateTime<Utc>>,
    ) -> Self {
        if gte.is_some() || lte.is_some() {
            self.clauses.push(Clause::Between {
                field: field.to_string(),
                gte,
                lte,
            });
        }
        self
    }

    /// Case-insensitive substring match on any of `fields`.
    pub fn search(mut self, fields: &[&str], needle: Option<&str>) -> Self {
        let needle = match needle.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_lowercase(),
            _ => return self,
        };
        let alternatives = fields
            .iter()
            .map(|field| Filter {
                clauses: vec![Clause::Contains {
                    field: field.to_string(),
                    needle: needle.clone(),
                }],
            })
            .collect();
        self.clauses.push(Clause::Or(alternatives));
        self
    }

    pub fn or(mut self, alternatives: Vec<Filter>) -> Self {
        self.clauses.push(Clause::Or(alternatives));
        self
    }

    /// Conjunction of `self` and `other`.
    pub fn and(mut self, other: Filter) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate the filter against a document's JSON form.
    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|clause| clause.matches(doc))
    }
}

impl Clause {
    fn matches(&self, doc: &Value) -> bool {
        match self {
            Clause::Eq { field, value } => field_equals(doc.get(field), value),
            Clause::In { field, values } => {
                let actual = doc.get(field);
                values.iter().any(|v| field_equals(actual, v))
            }
            Clause::Between { field, gte, lte } => {
                let Some(ts) = doc
                    .get(field)
                    .and_then(Value::as_str)
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&Utc))
                else {
                    return false;
                };
                gte.map_or(true, |lower| ts >= lower) && lte.map_or(true, |upper| ts <= upper)
            }
            Clause::Contains { field, needle } => doc
                .get(field)
                .and_then(Value::as_str)
                .map(|s| s.to_lowercase().contains(needle.as_str()))
                .unwrap_or(false),
            Clause::Or(alternatives) => alternatives.iter().any(|f| f.matches(doc)),
        }
    }
}

fn field_equals(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (None, Value::Null) => true,
        (None, _) => false,
        (Some(a), e) => a == e,
    }
}
