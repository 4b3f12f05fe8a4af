pub mod admin;
pub mod ai;
pub mod auth;
pub mod conversations;
pub mod error;
pub mod middleware;
pub mod profiles;
pub mod routes;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;
