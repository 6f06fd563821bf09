//! Core domain entities.
//!
//! - [`Link`] - A shortened URL mapping with health and click metadata
//! - [`NewLink`] - Input for creating a link

pub mod link;

pub use link::{Link, MAX_CODE_LENGTH, NewLink};
