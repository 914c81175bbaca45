// Library modules
pub mod api;
pub mod config;
pub mod middleware;
pub mod models;
pub mod programs;
pub mod proxy;
pub mod rate_limit;
pub mod routes;
pub mod simulator;
pub mod telemetry;
pub mod utils;

// Main application state and shared types
pub use models::*;
pub use routes::build_router;
