//! TypeDef table support for .NET metadata.
//!
//! The TypeDef table (ID 0x02) lists every type defined in the module: classes, interfaces,
//! value types, enums and delegates. Row 1 is always the `<Module>` pseudo-type that owns global
//! fields and methods.
//!
//! ## Table Structure
//!
//! - **Flags** (4-byte bitmask): [`TypeAttributes`] controlling visibility, layout, and semantics
//! - **TypeName** (string heap index): Simple name of the type (without namespace)
//! - **TypeNamespace** (string heap index): Namespace containing the type (empty for global and
//!   nested types)
//! - **Extends** (coded index): Base type reference (TypeDef, TypeRef, or TypeSpec)
//! - **FieldList** (Field table index): First field belonging to this type
//! - **MethodList** (MethodDef table index): First method belonging to this type
//!
//! ## ECMA-335 Reference
//!
//! See ECMA-335, Partition II, Section 22.37.
//!
//! **Table ID**: `0x02`

mod raw;
mod reader;

pub use raw::*;

/// Flag constants of the TypeDef `Flags` column, ECMA-335 II.23.1.15
#[allow(non_snake_case)]
pub mod TypeAttributes {
    /// Mask for the visibility bits
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Not visible outside the assembly
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Visible outside the assembly
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Nested, public visibility
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Nested, private visibility
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Nested, family visibility
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Nested, assembly visibility
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Nested, family and assembly visibility
    pub const NESTED_FAM_AND_ASSEM: u32 = 0x0000_0006;
    /// Nested, family or assembly visibility
    pub const NESTED_FAM_OR_ASSEM: u32 = 0x0000_0007;
    /// Mask for the layout bits
    pub const LAYOUT_MASK: u32 = 0x0000_0018;
    /// Fields are laid out automatically
    pub const AUTO_LAYOUT: u32 = 0x0000_0000;
    /// Fields are laid out sequentially
    pub const SEQUENTIAL_LAYOUT: u32 = 0x0000_0008;
    /// Field offsets are given explicitly
    pub const EXPLICIT_LAYOUT: u32 = 0x0000_0010;
    /// Mask for the class semantics bit
    pub const CLASS_SEMANTICS_MASK: u32 = 0x0000_0020;
    /// The type is a class
    pub const CLASS: u32 = 0x0000_0000;
    /// The type is an interface
    pub const INTERFACE: u32 = 0x0000_0020;
    /// The type is abstract
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// The type cannot be derived from
    pub const SEALED: u32 = 0x0000_0100;
    /// The name is special, e.g. `<Module>`
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
    /// Imported from COM
    pub const IMPORT: u32 = 0x0000_1000;
    /// Serializable
    pub const SERIALIZABLE: u32 = 0x0000_2000;
    /// Type initializer may run before the first static field access
    pub const BEFORE_FIELD_INIT: u32 = 0x0010_0000;
}
