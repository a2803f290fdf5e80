//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and ephemeral storage.
//!
//! # Modules
//!
//! - [`cache`] - Ephemeral store (Redis and in-process) and the destination cache
//! - [`persistence`] - PostgreSQL repository implementations

pub mod cache;
pub mod persistence;
