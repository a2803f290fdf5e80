//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped through `FromRow`.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link storage, ownership-scoped mutation and counters
//! - [`PgClickRepository`] - Click inserts
//! - [`PgDashboardRepository`] - Per-owner aggregate queries
//! - [`PgTokenRepository`] - API token storage and validation

pub mod pg_click_repository;
pub mod pg_dashboard_repository;
pub mod pg_link_repository;
pub mod pg_token_repository;

pub use pg_click_repository::PgClickRepository;
pub use pg_dashboard_repository::PgDashboardRepository;
pub use pg_link_repository::PgLinkRepository;
pub use pg_token_repository::PgTokenRepository;
