//! Helper functions shared by the HTTP layer and the services.
//!
//! - [`code_generator`] - Short code generation and format checks
//! - [`url_normalizer`] - Target URL validation and canonical form

pub mod code_generator;
pub mod url_normalizer;
