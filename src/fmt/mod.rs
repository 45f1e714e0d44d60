//! Rendering of query results.

pub mod json;
pub mod text;
