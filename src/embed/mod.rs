//! Query/document embedding.
//!
//! `HostedEmbedder` calls the hosted feature-extraction pipeline. The hosted
//! API is loose about response shape (a vector, or a batch wrapping one
//! vector), so everything funnels through [`normalize_embedding`].

mod hosted;

pub use hosted::HostedEmbedder;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::errors::ApiError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text into a fixed-length vector.
    ///
    /// Empty input is rejected; callers are expected to validate first.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;
}

/// Reduce any array-like numeric structure to a plain `Vec<f32>`.
///
/// Accepts `[0.1, ...]` and nested batches like `[[0.1, ...]]`, taking the
/// first row. Returns `None` for anything non-numeric or empty.
pub(crate) fn normalize_embedding(value: &Value) -> Option<Vec<f32>> {
    let arr = value.as_array()?;
    match arr.first()? {
        Value::Number(_) => arr
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect(),
        Value::Array(_) => normalize_embedding(arr.first()?),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_vector_passes_through() {
        let vec = normalize_embedding(&json!([0.25, -0.5, 1.0])).unwrap();
        assert_eq!(vec, vec![0.25, -0.5, 1.0]);
    }

    #[test]
    fn batch_of_one_is_unwrapped() {
        let vec = normalize_embedding(&json!([[0.25, -0.5]])).unwrap();
        assert_eq!(vec, vec![0.25, -0.5]);
    }

    #[test]
    fn doubly_nested_batches_unwrap_recursively() {
        let vec = normalize_embedding(&json!([[[1.0, 2.0]]])).unwrap();
        assert_eq!(vec, vec![1.0, 2.0]);
    }

    #[test]
    fn non_numeric_shapes_are_rejected() {
        assert!(normalize_embedding(&json!({"error": "loading"})).is_none());
        assert!(normalize_embedding(&json!(["a", "b"])).is_none());
        assert!(normalize_embedding(&json!([])).is_none());
        assert!(normalize_embedding(&json!("0.1")).is_none());
    }
}
