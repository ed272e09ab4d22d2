mod model;
mod store;

pub use model::{Role, UserProfile};
pub use store::{fetch_candidate_profile, UserState, UserStore};
