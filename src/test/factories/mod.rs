//! Builders for synthetic test inputs.

pub mod image;
