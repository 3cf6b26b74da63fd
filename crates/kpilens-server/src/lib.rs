pub mod app;
pub mod config;
pub mod error;
pub mod metadata;
pub mod routes;
pub mod state;
