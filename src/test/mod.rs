//! Shared test infrastructure.
//!
//! - [`factories`] - builders that synthesise managed images from scratch

pub mod factories;
