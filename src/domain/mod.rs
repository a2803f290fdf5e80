//! Domain layer containing business entities and logic.
//!
//! Defines entities, repository interfaces and caller identity, independent of
//! infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`identity`] - Authenticated caller and rate-limit identity
//! - [`click_event`] - Click tracking event model
//! - [`click_worker`] - Asynchronous click processing worker
//!
//! # Click Processing Flow
//!
//! 1. The redirect handler resolves the code and builds a [`click_event::ClickEvent`]
//! 2. The event is offered to a bounded channel; a full queue drops it
//! 3. [`click_worker::run_click_worker`] drains the channel into bounded tasks
//! 4. Each task runs [`crate::application::services::ClickRecorder::record`]

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod identity;
pub mod repositories;
