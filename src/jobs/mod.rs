mod filter;
mod model;
pub mod posting;
mod store;

pub use filter::{compute_filtered_jobs, search_facets, toggle, unique, JobFilter};
pub use model::{Facets, Job, JobDraft};
pub use posting::post_job;
pub use store::{JobsState, JobsStore};
