//! `TypeRef` table support for .NET metadata.
//!
//! The `TypeRef` table (ID 0x01) contains references to types defined in other modules or
//! assemblies. Each row carries the resolution scope that says where the type lives, its name and
//! its namespace.
//!
//! ## ECMA-335 Specification
//! From ECMA-335, Partition II, Section 22.38:
//! > The TypeRef table has the following columns:
//! > - ResolutionScope (an index into a Module, ModuleRef, AssemblyRef or TypeRef table)
//! > - TypeName (an index into the String heap)
//! > - TypeNamespace (an index into the String heap)

mod raw;
mod reader;

pub use raw::*;
