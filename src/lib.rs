pub mod config;
pub mod database;
pub mod handlers;
pub mod model;
pub mod server;
