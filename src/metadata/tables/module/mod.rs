//! # Module Table Module
//!
//! Access to the Module metadata table (ID 0x00), which names the current module and carries its
//! version identifier (Mvid). A well-formed module has exactly one row.
//!
//! ## Usage
//!
//! ```rust
//! use nsscope::metadata::tables::ModuleRaw;
//! ```

mod raw;
mod reader;

pub use raw::*;
