//! Repository trait definitions for the domain layer.
//!
//! These traits are the narrow interfaces the click pipeline, the URL monitor and
//! the HTTP handlers use to reach storage. Implementations live in
//! `crate::infrastructure::persistence`; mock implementations are generated with
//! `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Link lookup, listing and health updates
//! - [`ClickRepository`] - Atomic click counters

pub mod click_repository;
pub mod link_repository;

pub use click_repository::ClickRepository;
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
