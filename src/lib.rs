// Library interface for aidigest modules
// This allows tests and other binaries to import modules

pub mod config;
pub mod digest;
pub mod error;
pub mod fetch;
pub mod llm;
pub mod model;
pub mod notify;
pub mod report;
pub mod runner;
pub mod scrape;
pub mod store;
