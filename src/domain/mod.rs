//! Domain layer: entities, collaborator traits and the background pipelines.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Storage trait definitions
//! - [`prober`] - Reachability probe trait
//! - [`click_event`] - Click tracking event model
//! - [`click_channel`] - Bounded, non-blocking hand-off queue for click events
//! - [`click_worker`] - Worker pool persisting click counts
//! - [`url_monitor`] - Periodic link health monitor
//! - [`metrics`] - Pipeline and monitor counters
//!
//! # Click Processing Flow
//!
//! 1. The redirect handler builds a [`click_event::ClickEvent`]
//! 2. [`click_channel::ClickChannel::enqueue`] accepts it or drops it when full
//! 3. One worker of [`click_worker::ClickWorkerPool`] claims it
//! 4. The click count is incremented via [`repositories::ClickRepository`]

pub mod click_channel;
pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod metrics;
pub mod prober;
pub mod repositories;
pub mod url_monitor;
