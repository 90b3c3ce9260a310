//! Shared utilities: token handling and validated request extractors.

pub mod jwt;
pub mod validate;
