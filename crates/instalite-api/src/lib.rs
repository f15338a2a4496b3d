pub mod auth;
pub mod captions;
pub mod error;
pub mod follow;
pub mod middleware;
pub mod pagination;
pub mod posts;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod storage;
pub mod upload;
pub mod users;
mod views;

pub use routes::router;
pub use state::{AppState, AppStateInner};
