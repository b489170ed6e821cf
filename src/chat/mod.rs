//! Chat query orchestration: request types, filter translation, and the
//! pipeline that ties embedding, search, and generation together.

mod filter;
mod service;
mod types;

pub use filter::{parse_filters, to_predicate, FieldFilter};
pub use service::{ChatService, NO_RESULTS_FALLBACK};
pub use types::{QueryOutcome, QueryRequest};
