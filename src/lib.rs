pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

pub use api::{AppState, PipelineSettings};
pub use routes::create_router;
