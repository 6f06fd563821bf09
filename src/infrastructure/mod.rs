//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and reachability probing.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL and in-memory repository implementations
//! - [`http_prober`] - `reqwest` based URL prober used by the monitor

pub mod http_prober;
pub mod persistence;

pub use http_prober::HttpProber;
