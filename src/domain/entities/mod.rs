//! Core domain entities.
//!
//! - [`Link`] - A shortened URL mapping
//! - [`Click`] - A recorded visit to a shortened link
//!
//! Creation inputs live next to the entity (`NewLink`, `NewClick`), as does the
//! partial update type [`LinkPatch`].

pub mod click;
pub mod link;

pub use click::{Click, NewClick};
pub use link::{Link, LinkPage, LinkPatch, NewLink};

#[cfg(test)]
pub(crate) use link::sample_link;
