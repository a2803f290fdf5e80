//! Utility functions for code generation, URL processing, and request handling.
//!
//! - [`code_generator`] - Short code generation and custom slug validation
//! - [`url_normalizer`] - URL normalization and sanitization
//! - [`user_agent`] - Device, browser and OS classification
//! - [`client_ip`] - Client address resolution behind optional proxies
//! - [`token`] - API token generation and hashing

pub mod client_ip;
pub mod code_generator;
pub mod token;
pub mod url_normalizer;
pub mod user_agent;
