//! Identifiers of the ECMA-335 metadata tables.

use strum::{EnumCount, EnumIter};

/// All metadata tables that can appear in a `#~` or `#-` stream, with their table number.
///
/// The `*Ptr`, `EncLog` and `EncMap` tables only occur in unoptimized (`#-`) streams written by
/// edit-and-continue capable compilers. They carry no names, but their rows still have to be
/// skipped to find the tables behind them.
///
/// Iteration order (via [`strum::IntoEnumIterator`]) equals the on-disk table order.
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash, PartialOrd, Ord)]
pub enum TableId {
    /// `Module`, the single row describing this module
    Module = 0x00,
    /// `TypeRef`, references to types defined in other modules or assemblies
    TypeRef = 0x01,
    /// `TypeDef`, types defined in this module
    TypeDef = 0x02,
    /// `FieldPtr`, indirection into `Field` in unoptimized metadata
    FieldPtr = 0x03,
    /// `Field`
    Field = 0x04,
    /// `MethodPtr`, indirection into `MethodDef` in unoptimized metadata
    MethodPtr = 0x05,
    /// `MethodDef`
    MethodDef = 0x06,
    /// `ParamPtr`, indirection into `Param` in unoptimized metadata
    ParamPtr = 0x07,
    /// `Param`
    Param = 0x08,
    /// `InterfaceImpl`
    InterfaceImpl = 0x09,
    /// `MemberRef`
    MemberRef = 0x0A,
    /// `Constant`
    Constant = 0x0B,
    /// `CustomAttribute`
    CustomAttribute = 0x0C,
    /// `FieldMarshal`
    FieldMarshal = 0x0D,
    /// `DeclSecurity`
    DeclSecurity = 0x0E,
    /// `ClassLayout`
    ClassLayout = 0x0F,
    /// `FieldLayout`
    FieldLayout = 0x10,
    /// `StandAloneSig`
    StandAloneSig = 0x11,
    /// `EventMap`
    EventMap = 0x12,
    /// `EventPtr`, indirection into `Event` in unoptimized metadata
    EventPtr = 0x13,
    /// `Event`
    Event = 0x14,
    /// `PropertyMap`
    PropertyMap = 0x15,
    /// `PropertyPtr`, indirection into `Property` in unoptimized metadata
    PropertyPtr = 0x16,
    /// `Property`
    Property = 0x17,
    /// `MethodSemantics`
    MethodSemantics = 0x18,
    /// `MethodImpl`
    MethodImpl = 0x19,
    /// `ModuleRef`
    ModuleRef = 0x1A,
    /// `TypeSpec`
    TypeSpec = 0x1B,
    /// `ImplMap`
    ImplMap = 0x1C,
    /// `FieldRVA`
    FieldRVA = 0x1D,
    /// `EncLog`, edit-and-continue log
    EncLog = 0x1E,
    /// `EncMap`, edit-and-continue token map
    EncMap = 0x1F,
    /// `Assembly`
    Assembly = 0x20,
    /// `AssemblyProcessor`
    AssemblyProcessor = 0x21,
    /// `AssemblyOS`
    AssemblyOS = 0x22,
    /// `AssemblyRef`
    AssemblyRef = 0x23,
    /// `AssemblyRefProcessor`
    AssemblyRefProcessor = 0x24,
    /// `AssemblyRefOS`
    AssemblyRefOS = 0x25,
    /// `File`
    File = 0x26,
    /// `ExportedType`
    ExportedType = 0x27,
    /// `ManifestResource`
    ManifestResource = 0x28,
    /// `NestedClass`
    NestedClass = 0x29,
    /// `GenericParam`
    GenericParam = 0x2A,
    /// `MethodSpec`
    MethodSpec = 0x2B,
    /// `GenericParamConstraint`
    GenericParamConstraint = 0x2C,
}

impl TableId {
    /// Bit mask of every table number this reader knows, as used in the `valid` vector
    pub const KNOWN_MASK: u64 = (1 << Self::COUNT) - 1;

    /// The token prefix of rows in this table, e.g. `0x0200_0000` for `TypeDef`
    #[must_use]
    pub fn token_base(self) -> u32 {
        (self as u32) << 24
    }

    /// Returns `true` if bit `self` is set in a `valid` or `sorted` vector
    #[must_use]
    pub fn is_set(self, bitvec: u64) -> bool {
        bitvec & (1 << self as u64) != 0
    }
}

impl TryFrom<u8> for TableId {
    type Error = crate::Error;

    fn try_from(value: u8) -> crate::Result<Self> {
        use strum::IntoEnumIterator;

        TableId::iter()
            .find(|id| *id as u8 == value)
            .ok_or_else(|| malformed_error!("Unknown table ID: 0x{:02x}", value))
    }
}
