//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated via
//! `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Short link CRUD and counters
//! - [`ClickRepository`] - Click persistence
//! - [`DashboardRepository`] - Per-owner aggregates
//! - [`TokenRepository`] - API token authentication

pub mod click_repository;
pub mod dashboard_repository;
pub mod link_repository;
pub mod token_repository;

pub use click_repository::ClickRepository;
pub use dashboard_repository::{DailyCount, DashboardRepository};
pub use link_repository::LinkRepository;
pub use token_repository::{ApiToken, TokenRepository};

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use dashboard_repository::MockDashboardRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
