//! Application layer services implementing business logic.
//!
//! Services consume repository traits and give the HTTP handlers and the admin
//! CLI one API for link creation, lookup and statistics.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short link creation, lookup and stats
pub mod services;
