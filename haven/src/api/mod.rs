mod extractors;
mod frontend;
pub mod handlers;
pub mod openapi;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
