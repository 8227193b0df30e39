pub mod events;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod reconciler;
pub mod routes;

pub use routes::create_router;
