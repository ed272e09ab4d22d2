mod dto;
pub mod flow;

pub use dto::{AuthErrors, SignInRequest, SignUpRequest};
pub use flow::{sign_in, sign_out, sign_up};
