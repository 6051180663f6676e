//! # nsscope Prelude
//!
//! Re-exports of the types most callers need: loading an assembly, walking its types and
//! counting namespaces.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all nsscope operations
pub use crate::Error;

/// The result type used throughout nsscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// A loaded, validated assembly
pub use crate::AssemblyView;

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Metadata
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Metadata root constants
pub use crate::metadata::root::CIL_HEADER_MAGIC;

/// Heaps and the tables stream
pub use crate::metadata::streams::{Blob, Guid, Strings, TablesHeader, UserStrings};

/// Table identifiers and typed rows
pub use crate::metadata::tables::{ModuleRaw, TableId, TypeAttributes, TypeDefRaw, TypeRefRaw};

// ================================================================================================
// Types and Namespaces
// ================================================================================================

/// Decoded types and the sources producing them
pub use crate::metadata::types::{DecodedType, DecodedTypeRef, TypeSource};

/// Caller-side namespace policy
pub use crate::filter::{NamespaceFilter, NamespaceTally};
