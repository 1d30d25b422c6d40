pub mod api;
pub mod cache;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod geo;
pub mod llm;
pub mod models;
pub mod policy;
pub mod search;
pub mod services;
