//! Business logic services for the application layer.

pub mod auth_service;
pub mod click_recorder;
pub mod code_allocator;
pub mod dashboard_service;
pub mod link_service;
pub mod rate_limiter;
pub mod redirect_service;

pub use auth_service::AuthService;
pub use click_recorder::ClickRecorder;
pub use code_allocator::{AllocationError, CodeAllocator};
pub use dashboard_service::{DashboardService, DashboardStats};
pub use link_service::{CreateLink, LinkService};
pub use rate_limiter::{RateDecision, RateLimitConfig, RateLimiter};
pub use redirect_service::{RedirectService, ResolveError};
