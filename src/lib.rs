//! Client-side state for a job board: job listings with filtering and
//! facet aggregation, the signed-in user's profile, and the auth and
//! posting flows that drive them, over pluggable identity and
//! document-store collaborators.

pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod jobs;
pub mod lifecycle;
pub mod notifications;
pub mod state;
pub mod storage;
pub mod users;
pub mod validation;

pub use error::{BackendError, StoreError, StoreResult};
pub use state::AppState;
