pub mod analysis;
pub mod cache;
pub mod config;
pub mod loader;
pub mod models;
pub mod processor;
pub mod session;
