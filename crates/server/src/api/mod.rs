pub mod error;
pub mod handlers;
pub mod items;
pub mod middleware;
pub mod routes;
pub mod speaker_portal;
pub mod website;

pub use error::ApiError;
pub use routes::create_router;
