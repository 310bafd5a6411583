// Domain-driven module structure for droidtail.

// Core pipeline
pub mod parser;
pub mod pipeline;

// Glue
pub mod adb;
pub mod config;
pub mod filter;
pub mod runtime;
