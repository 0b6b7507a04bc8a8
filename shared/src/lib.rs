//! Shared types and models for the milk distribution warehouse
//!
//! This crate holds the document models, their status-transition tables and
//! the quantity checks shared by the backend and the browser (via WASM).

pub mod models;
pub mod types;
pub mod validation;
pub mod workflow;

pub use models::*;
pub use types::*;
pub use validation::*;
pub use workflow::*;
