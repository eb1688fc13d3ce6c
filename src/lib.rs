// OnTopic - content-graph projection into view models and navigation trees

// Topic graph, identifiers and associations
pub mod core;

// Content-type descriptors and their inherited attributes
pub mod schema;

// View-model schemas, mapped values and type lookup
pub mod framework;

// Topic to view-model mapping and reverse binding
pub mod mapping;

// Navigation trees and the root-level navigation cache
pub mod navigation;

// Topic storage
pub mod infrastructure;

// Built-in view model definitions
pub mod schemas;

// Common utilities
pub mod config;
pub mod error;
pub mod telemetry;
pub mod data_seeder;

// Re-exports for convenience
pub use error::{AppError, AppResult};
