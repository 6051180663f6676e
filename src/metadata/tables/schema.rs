//! Column layout of every metadata table.
//!
//! Only three tables get typed row readers, but the tables are stored back to back, so the size
//! of every table in front of and between them has to be known to find them. The layouts below
//! follow ECMA-335 II.22, including the `*Ptr` and edit-and-continue tables of `#-` streams.

use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::tables::{CodedIndex, CodedIndexType, TableId, TableInfo, TableInfoRef},
    Result,
};

/// The kind of value a column holds, which decides its width
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// A constant of the given number of bytes
    Fixed(u8),
    /// An index into `#Strings`
    Strings,
    /// An index into `#GUID`
    Guid,
    /// An index into `#Blob`
    Blob,
    /// A row index into the given table
    Table(TableId),
    /// A coded index of the given kind
    Coded(CodedIndexType),
}

impl ColumnType {
    /// Width of this column in bytes, given the stream's size information
    #[must_use]
    pub fn width(&self, info: &TableInfo) -> u8 {
        match self {
            ColumnType::Fixed(width) => *width,
            ColumnType::Strings => info.str_bytes(),
            ColumnType::Guid => info.guid_bytes(),
            ColumnType::Blob => info.blob_bytes(),
            ColumnType::Table(table) => info.table_index_bytes(*table),
            ColumnType::Coded(coded) => info.coded_index_bytes(*coded),
        }
    }
}

/// One column of a table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    /// Column name as used in ECMA-335
    pub name: &'static str,
    /// What the column holds
    pub kind: ColumnType,
}

macro_rules! columns {
    ($($name:literal : $kind:expr),* $(,)?) => {
        &[$(Column { name: $name, kind: $kind }),*]
    };
}

impl TableId {
    /// The columns of this table, in on-disk order
    #[must_use]
    #[rustfmt::skip]
    pub fn columns(self) -> &'static [Column] {
        use ColumnType::{Blob, Coded, Fixed, Guid, Strings, Table};
        use CodedIndexType as C;

        match self {
            TableId::Module => columns![
                "Generation": Fixed(2), "Name": Strings, "Mvid": Guid, "EncId": Guid, "EncBaseId": Guid,
            ],
            TableId::TypeRef => columns![
                "ResolutionScope": Coded(C::ResolutionScope), "TypeName": Strings, "TypeNamespace": Strings,
            ],
            TableId::TypeDef => columns![
                "Flags": Fixed(4), "TypeName": Strings, "TypeNamespace": Strings,
                "Extends": Coded(C::TypeDefOrRef), "FieldList": Table(TableId::Field),
                "MethodList": Table(TableId::MethodDef),
            ],
            TableId::FieldPtr => columns!["Field": Table(TableId::Field)],
            TableId::Field => columns!["Flags": Fixed(2), "Name": Strings, "Signature": Blob],
            TableId::MethodPtr => columns!["Method": Table(TableId::MethodDef)],
            TableId::MethodDef => columns![
                "RVA": Fixed(4), "ImplFlags": Fixed(2), "Flags": Fixed(2), "Name": Strings,
                "Signature": Blob, "ParamList": Table(TableId::Param),
            ],
            TableId::ParamPtr => columns!["Param": Table(TableId::Param)],
            TableId::Param => columns!["Flags": Fixed(2), "Sequence": Fixed(2), "Name": Strings],
            TableId::InterfaceImpl => columns![
                "Class": Table(TableId::TypeDef), "Interface": Coded(C::TypeDefOrRef),
            ],
            TableId::MemberRef => columns![
                "Class": Coded(C::MemberRefParent), "Name": Strings, "Signature": Blob,
            ],
            TableId::Constant => columns![
                "Type": Fixed(1), "Padding": Fixed(1), "Parent": Coded(C::HasConstant), "Value": Blob,
            ],
            TableId::CustomAttribute => columns![
                "Parent": Coded(C::HasCustomAttribute), "Type": Coded(C::CustomAttributeType),
                "Value": Blob,
            ],
            TableId::FieldMarshal => columns![
                "Parent": Coded(C::HasFieldMarshal), "NativeType": Blob,
            ],
            TableId::DeclSecurity => columns![
                "Action": Fixed(2), "Parent": Coded(C::HasDeclSecurity), "PermissionSet": Blob,
            ],
            TableId::ClassLayout => columns![
                "PackingSize": Fixed(2), "ClassSize": Fixed(4), "Parent": Table(TableId::TypeDef),
            ],
            TableId::FieldLayout => columns!["Offset": Fixed(4), "Field": Table(TableId::Field)],
            TableId::StandAloneSig => columns!["Signature": Blob],
            TableId::EventMap => columns![
                "Parent": Table(TableId::TypeDef), "EventList": Table(TableId::Event),
            ],
            TableId::EventPtr => columns!["Event": Table(TableId::Event)],
            TableId::Event => columns![
                "EventFlags": Fixed(2), "Name": Strings, "EventType": Coded(C::TypeDefOrRef),
            ],
            TableId::PropertyMap => columns![
                "Parent": Table(TableId::TypeDef), "PropertyList": Table(TableId::Property),
            ],
            TableId::PropertyPtr => columns!["Property": Table(TableId::Property)],
            TableId::Property => columns!["Flags": Fixed(2), "Name": Strings, "Type": Blob],
            TableId::MethodSemantics => columns![
                "Semantics": Fixed(2), "Method": Table(TableId::MethodDef),
                "Association": Coded(C::HasSemantics),
            ],
            TableId::MethodImpl => columns![
                "Class": Table(TableId::TypeDef), "MethodBody": Coded(C::MethodDefOrRef),
                "MethodDeclaration": Coded(C::MethodDefOrRef),
            ],
            TableId::ModuleRef => columns!["Name": Strings],
            TableId::TypeSpec => columns!["Signature": Blob],
            TableId::ImplMap => columns![
                "MappingFlags": Fixed(2), "MemberForwarded": Coded(C::MemberForwarded),
                "ImportName": Strings, "ImportScope": Table(TableId::ModuleRef),
            ],
            TableId::FieldRVA => columns!["RVA": Fixed(4), "Field": Table(TableId::Field)],
            TableId::EncLog => columns!["Token": Fixed(4), "FuncCode": Fixed(4)],
            TableId::EncMap => columns!["Token": Fixed(4)],
            TableId::Assembly => columns![
                "HashAlgId": Fixed(4), "MajorVersion": Fixed(2), "MinorVersion": Fixed(2),
                "BuildNumber": Fixed(2), "RevisionNumber": Fixed(2), "Flags": Fixed(4),
                "PublicKey": Blob, "Name": Strings, "Culture": Strings,
            ],
            TableId::AssemblyProcessor => columns!["Processor": Fixed(4)],
            TableId::AssemblyOS => columns![
                "OSPlatformID": Fixed(4), "OSMajorVersion": Fixed(4), "OSMinorVersion": Fixed(4),
            ],
            TableId::AssemblyRef => columns![
                "MajorVersion": Fixed(2), "MinorVersion": Fixed(2), "BuildNumber": Fixed(2),
                "RevisionNumber": Fixed(2), "Flags": Fixed(4), "PublicKeyOrToken": Blob,
                "Name": Strings, "Culture": Strings, "HashValue": Blob,
            ],
            TableId::AssemblyRefProcessor => columns![
                "Processor": Fixed(4), "AssemblyRef": Table(TableId::AssemblyRef),
            ],
            TableId::AssemblyRefOS => columns![
                "OSPlatformId": Fixed(4), "OSMajorVersion": Fixed(4), "OSMinorVersion": Fixed(4),
                "AssemblyRef": Table(TableId::AssemblyRef),
            ],
            TableId::File => columns!["Flags": Fixed(4), "Name": Strings, "HashValue": Blob],
            TableId::ExportedType => columns![
                "Flags": Fixed(4), "TypeDefId": Fixed(4), "TypeName": Strings,
                "TypeNamespace": Strings, "Implementation": Coded(C::Implementation),
            ],
            TableId::ManifestResource => columns![
                "Offset": Fixed(4), "Flags": Fixed(4), "Name": Strings,
                "Implementation": Coded(C::Implementation),
            ],
            TableId::NestedClass => columns![
                "NestedClass": Table(TableId::TypeDef), "EnclosingClass": Table(TableId::TypeDef),
            ],
            TableId::GenericParam => columns![
                "Number": Fixed(2), "Flags": Fixed(2), "Owner": Coded(C::TypeOrMethodDef),
                "Name": Strings,
            ],
            TableId::MethodSpec => columns![
                "Method": Coded(C::MethodDefOrRef), "Instantiation": Blob,
            ],
            TableId::GenericParamConstraint => columns![
                "Owner": Table(TableId::GenericParam), "Constraint": Coded(C::TypeDefOrRef),
            ],
        }
    }

    /// Size of one row of this table in bytes
    #[must_use]
    pub fn row_size(self, info: &TableInfo) -> u32 {
        self.columns()
            .iter()
            .map(|column| u32::from(column.kind.width(info)))
            .sum()
    }
}

/// Reads the columns of one row in the order [`TableId::columns`] declares them.
///
/// Each call consumes the next column, so the typed readers list their fields in schema order
/// and never state a width themselves.
pub(crate) struct RowCursor<'a> {
    table: TableId,
    data: &'a [u8],
    offset: &'a mut usize,
    sizes: &'a TableInfoRef,
    columns: std::slice::Iter<'static, Column>,
}

impl<'a> RowCursor<'a> {
    pub(crate) fn new(
        table: TableId,
        data: &'a [u8],
        offset: &'a mut usize,
        sizes: &'a TableInfoRef,
    ) -> Self {
        RowCursor {
            table,
            data,
            offset,
            sizes,
            columns: table.columns().iter(),
        }
    }

    fn column(&mut self) -> Result<&'static Column> {
        self.columns
            .next()
            .ok_or_else(|| malformed_error!("Read past the last column of {:?}", self.table))
    }

    /// The next column as a plain number: a constant, heap index or table index
    pub(crate) fn value(&mut self) -> Result<u32> {
        let column = self.column()?;
        match column.kind {
            ColumnType::Fixed(1) => Ok(u32::from(read_le_at::<u8>(self.data, self.offset)?)),
            ColumnType::Fixed(2) => Ok(u32::from(read_le_at::<u16>(self.data, self.offset)?)),
            ColumnType::Fixed(4) => read_le_at::<u32>(self.data, self.offset),
            ColumnType::Fixed(width) => Err(malformed_error!(
                "Column {} of {:?} has unsupported width {}",
                column.name,
                self.table,
                width
            )),
            ColumnType::Coded(_) => Err(malformed_error!(
                "Column {} of {:?} is a coded index",
                column.name,
                self.table
            )),
            kind => read_le_at_dyn(self.data, self.offset, kind.width(self.sizes) == 4),
        }
    }

    /// The next column as a decoded coded index
    pub(crate) fn coded(&mut self) -> Result<CodedIndex> {
        let column = self.column()?;
        let ColumnType::Coded(kind) = column.kind else {
            return Err(malformed_error!(
                "Column {} of {:?} is not a coded index",
                column.name,
                self.table
            ));
        };

        CodedIndex::read(self.data, self.offset, self.sizes, kind)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::{
        metadata::tables::{ModuleRaw, RowReadable, TypeDefRaw, TypeRefRaw},
        Error,
    };

    #[test]
    fn every_table_has_columns() {
        for table in TableId::iter() {
            assert!(!table.columns().is_empty(), "{table:?} has no columns");
        }
    }

    #[test]
    fn small_row_sizes() {
        let info = TableInfo::new_test(&[], false, false, false);

        assert_eq!(TableId::Module.row_size(&info), 10);
        assert_eq!(TableId::TypeRef.row_size(&info), 6);
        assert_eq!(TableId::TypeDef.row_size(&info), 14);
        assert_eq!(TableId::Field.row_size(&info), 6);
        assert_eq!(TableId::MethodDef.row_size(&info), 14);
        assert_eq!(TableId::Constant.row_size(&info), 6);
        assert_eq!(TableId::EncLog.row_size(&info), 8);
        assert_eq!(TableId::Assembly.row_size(&info), 22);
        assert_eq!(TableId::AssemblyRef.row_size(&info), 20);
    }

    #[test]
    fn large_row_sizes() {
        let info = TableInfo::new_test(
            &[(TableId::Field, 0x1_0000), (TableId::TypeDef, 0x4000)],
            true,
            true,
            true,
        );

        assert_eq!(TableId::Module.row_size(&info), 2 + 4 * 4);
        assert_eq!(TableId::TypeDef.row_size(&info), 4 + 4 + 4 + 4 + 4 + 2);
        assert_eq!(TableId::FieldPtr.row_size(&info), 4);
        assert_eq!(TableId::NestedClass.row_size(&info), 4);
        assert_eq!(TableId::InterfaceImpl.row_size(&info), 2 + 4);
    }

    #[test]
    fn typed_readers_consume_whole_rows() {
        for info in [
            TableInfo::new_test(&[(TableId::TypeRef, 3)], false, false, false),
            TableInfo::new_test(
                &[(TableId::Field, 0x2_0000), (TableId::AssemblyRef, 0x8000)],
                true,
                false,
                true,
            ),
        ] {
            let info = Arc::new(info);
            let data = [0_u8; 64];

            let mut offset = 0;
            ModuleRaw::row_read(&data, &mut offset, 1, &info).unwrap();
            assert_eq!(offset as u32, TableId::Module.row_size(&info));

            let mut offset = 0;
            TypeRefRaw::row_read(&data, &mut offset, 1, &info).unwrap();
            assert_eq!(offset as u32, TableId::TypeRef.row_size(&info));

            let mut offset = 0;
            TypeDefRaw::row_read(&data, &mut offset, 1, &info).unwrap();
            assert_eq!(offset as u32, TableId::TypeDef.row_size(&info));
        }
    }

    #[test]
    fn cursor_follows_column_kinds() {
        let info = Arc::new(TableInfo::new_test(&[(TableId::AssemblyRef, 1)], false, false, false));
        let data = [0x06, 0x00, 0x2A, 0x00, 0x00, 0x00];

        let mut offset = 0;
        let mut cursor = RowCursor::new(TableId::TypeRef, &data, &mut offset, &info);
        assert!(matches!(cursor.value(), Err(Error::MalformedMetadata { .. })));

        let mut offset = 0;
        let mut cursor = RowCursor::new(TableId::TypeRef, &data, &mut offset, &info);
        assert_eq!(cursor.coded().unwrap(), CodedIndex::new(TableId::AssemblyRef, 1));
        assert_eq!(cursor.value().unwrap(), 0x2A);
        assert!(matches!(cursor.coded(), Err(Error::MalformedMetadata { .. })));

        let mut offset = 0;
        let mut cursor = RowCursor::new(TableId::ModuleRef, &data, &mut offset, &info);
        assert_eq!(cursor.value().unwrap(), 0x06);
        assert!(matches!(cursor.value(), Err(Error::MalformedMetadata { .. })));
        assert_eq!(offset, 2);
    }
}
