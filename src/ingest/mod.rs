//! Knowledge-document preparation.
//!
//! Turns job records into embedded snippets for the vector index: one
//! snippet per job (`title — description Requirements: ... Location: ...`),
//! split into ~800-character chunks on sentence boundaries when it runs
//! long. Each chunk carries the job's filterable metadata.

use std::fs;
use std::path::Path;

use chrono::DateTime;
use serde_json::{json, Value};

use crate::index::DocId;

/// Snippets above this length get chunked.
const MAX_SNIPPET_CHARS: usize = 1000;
/// Target chunk size when splitting.
const CHUNK_CHARS: usize = 800;

/// Everything needed to index one job: its id, filterable metadata, and the
/// snippet(s) to embed.
#[derive(Debug, Clone)]
pub struct JobSnippets {
    pub source_id: DocId,
    pub metadata: Value,
    pub snippets: Vec<String>,
}

/// Read an exported array of job records.
pub fn load_jobs(path: &Path) -> anyhow::Result<Vec<Value>> {
    let contents = fs::read_to_string(path)?;
    let jobs: Vec<Value> = serde_json::from_str(&contents)?;
    Ok(jobs)
}

/// Build the snippets and metadata for one job record.
///
/// Records without a usable id are skipped (logged, not fatal): the export
/// format is not under our control.
pub fn prepare_job(job: &Value) -> Option<JobSnippets> {
    let source_id = match job.get("_id").and_then(extract_id) {
        Some(id) => id,
        None => {
            tracing::warn!("skipping job record without a valid _id");
            return None;
        }
    };

    let title = str_field(job, "title");
    let description = str_field(job, "description");
    let location = str_field(job, "location");
    let requirements = requirements_text(job.get("requirements"));
    let experience_level = job
        .get("experienceLevel")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let company_id = job.get("company").and_then(extract_id);
    let posted_date = job.get("createdAt").and_then(extract_date);

    let metadata = json!({
        "jobId": source_id.to_ejson(),
        "companyId": company_id.as_ref().map(DocId::to_ejson).unwrap_or(Value::Null),
        "experienceLevel": experience_level,
        "location": location,
        "postedDate": posted_date.map(Value::String).unwrap_or(Value::Null),
    });

    let full_snippet = format!(
        "{} — {} Requirements: {}. Location: {}.",
        title, description, requirements, location
    );

    let snippets = if full_snippet.len() > MAX_SNIPPET_CHARS {
        let combined = format!("{} Requirements: {}", description, requirements);
        chunk_text(&combined, CHUNK_CHARS)
            .into_iter()
            .map(|chunk| format!("{} — {} Location: {}.", title, chunk, location))
            .collect()
    } else {
        vec![full_snippet]
    };

    Some(JobSnippets {
        source_id,
        metadata,
        snippets,
    })
}

/// Split text into chunks of roughly `max_chars`, keeping sentences whole.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let flattened = text.replace('\n', " ");
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in flattened.split(". ") {
        // +2 accounts for the ". " removed by the split.
        if current.len() + sentence.len() + 2 < max_chars {
            current.push_str(sentence);
            current.push_str(". ");
        } else {
            if !current.trim().is_empty() {
                chunks.push(current.trim().to_string());
            }
            current = format!("{}. ", sentence);
        }
    }
    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}

/// Ids arrive either as a plain hex string or wrapped as `{"$oid": "..."}`.
fn extract_id(value: &Value) -> Option<DocId> {
    let raw = value
        .as_str()
        .or_else(|| value.get("$oid").and_then(Value::as_str))?;
    DocId::parse(raw).ok()
}

/// Dates arrive either as an ISO string or wrapped as `{"$date": "..."}`.
fn extract_date(value: &Value) -> Option<String> {
    let raw = value
        .as_str()
        .or_else(|| value.get("$date").and_then(Value::as_str))?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.to_rfc3339())
}

fn str_field(job: &Value, key: &str) -> String {
    job.get(key).and_then(Value::as_str).unwrap_or("").to_string()
}

fn requirements_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
