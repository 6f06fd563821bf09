//! Repository implementations.
//!
//! Concrete implementations of domain repository traits: PostgreSQL via SQLx
//! for production and mutex-guarded maps for tests and database-less runs.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link storage, lookup and health updates
//! - [`PgClickRepository`] - Atomic click counters
//! - [`InMemoryLinkRepository`] / [`InMemoryClickRepository`] - In-process store

pub mod memory;
pub mod pg_click_repository;
pub mod pg_link_repository;

pub use memory::{InMemoryClickRepository, InMemoryLinkRepository};
pub use pg_click_repository::PgClickRepository;
pub use pg_link_repository::PgLinkRepository;
