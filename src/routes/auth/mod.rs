mod handler;
mod model;

pub use handler::login;
pub use model::{Admin, LoginRequest, LoginResponse, normalize_email};
