//! Filter DSL translation.
//!
//! The wire format is an open map from field name to an arbitrary JSON value.
//! It is parsed at the boundary into a closed per-field union, then rendered
//! into the index's native predicate document. Parsing fails fast on the
//! first invalid field.

use serde_json::{Map, Value};

use crate::core::errors::ApiError;
use crate::index::DocId;

/// Bound operators copied into range predicates; everything else is dropped.
const RANGE_OPS: [&str; 4] = ["$lt", "$lte", "$gt", "$gte"];

/// Fields whose values are entity identifiers in the source data.
const ID_FIELDS: [&str; 2] = ["companyId", "jobId"];

/// One parsed filter entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// Exact match on a scalar value.
    Equals(Value),
    /// One or more recognized bounds, e.g. `{"$lte": 2}`.
    Range(Map<String, Value>),
    /// Equality on an entity identifier, validated and normalized.
    IdEquals(DocId),
}

/// Parse the raw filter map into the closed union.
pub fn parse_filters(raw: &Map<String, Value>) -> Result<Vec<(String, FieldFilter)>, ApiError> {
    let mut parsed = Vec::with_capacity(raw.len());

    for (field, value) in raw {
        let filter = if ID_FIELDS.contains(&field.as_str()) {
            let id = value
                .as_str()
                .ok_or_else(|| {
                    ApiError::BadRequest(format!(
                        "invalid identifier for field '{}': expected a string id",
                        field
                    ))
                })
                .and_then(DocId::parse)?;
            FieldFilter::IdEquals(id)
        } else if let Some(range) = value.as_object() {
            let bounds: Map<String, Value> = range
                .iter()
                .filter(|(op, _)| RANGE_OPS.contains(&op.as_str()))
                .map(|(op, bound)| (op.clone(), bound.clone()))
                .collect();
            if bounds.is_empty() {
                return Err(ApiError::BadRequest(format!(
                    "invalid filter for field '{}': no recognized range bounds",
                    field
                )));
            }
            FieldFilter::Range(bounds)
        } else {
            FieldFilter::Equals(value.clone())
        };

        parsed.push((field.clone(), filter));
    }

    Ok(parsed)
}

/// Render parsed filters into the native predicate document, scoped under
/// the metadata namespace. Fields combine by implicit AND. Empty -> `None`.
pub fn to_predicate(filters: &[(String, FieldFilter)]) -> Option<Value> {
    if filters.is_empty() {
        return None;
    }

    let mut predicate = Map::new();
    for (field, filter) in filters {
        let key = format!("metadata.{}", field);
        let value = match filter {
            FieldFilter::Equals(value) => value.clone(),
            FieldFilter::Range(bounds) => Value::Object(bounds.clone()),
            FieldFilter::IdEquals(id) => id.to_ejson(),
        };
        predicate.insert(key, value);
    }
    Some(Value::Object(predicate))
}
