pub mod auth;
pub mod board;
pub mod client;
pub mod config;
pub mod errors;
pub mod kv;
pub mod models;
pub mod mutate;
pub mod query;
pub mod store;
pub mod validate;
