pub mod config;
pub mod error;
pub mod pipeline;
pub mod providers;
pub mod routes;
pub mod sample;
pub mod state;
pub mod types;
