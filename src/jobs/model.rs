use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::storage::{decode, Document, JOBS};

/// A job posting. `id` is the document key and is not stored in the fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub description: String,
    /// Display string, e.g. "₹80,000 - ₹1,20,000".
    pub salary: String,
    pub location: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub employer_id: String,
    pub company_name: String,
    #[serde(default)]
    pub candidates: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Job {
    pub fn from_document(doc: Document) -> StoreResult<Self> {
        let mut job: Job = decode(JOBS, &doc.key, doc.fields)?;
        job.id = doc.key;
        Ok(job)
    }

    pub fn has_applied(&self, user_id: &str) -> bool {
        !user_id.is_empty() && self.candidates.iter().any(|c| c == user_id)
    }
}

/// Union of every skill and location used by any posting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Facets {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Raw form input for a new posting; `skills` is comma separated.
#[derive(Debug, Clone, Default)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub salary: String,
    pub location: String,
    pub skills: String,
}
