pub mod api;
pub mod config;
pub mod ingestion;
pub mod report;
pub mod security;
