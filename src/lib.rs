pub mod analyzers;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod fetch;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod store;
