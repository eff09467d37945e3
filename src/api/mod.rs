pub mod handlers;
pub mod routes;
mod views;

pub use routes::create_app;
