use std::{ops::Range, sync::Arc};

use strum::{EnumCount, IntoEnumIterator};

use crate::{
    file::io::{read_le, read_le_at},
    metadata::{
        streams::{Guid, Strings},
        tables::{
            CodedIndex, HeapSizes, MetadataTable, ModuleRaw, RowReadable, TableAccess, TableData,
            TableId, TableInfo, TableInfoRef, TypeDefRaw, TypeRefRaw,
        },
    },
    Error::OutOfBounds,
    Result,
};

/// The header of the `#~` (or `#-`) stream, together with a view of every table in it.
///
/// Tables follow the header back to back in ascending [`TableId`] order. [`TablesHeader::from`]
/// walks all of them to verify that the declared row counts fit into the stream, and keeps typed
/// [`MetadataTable`] views for the Module, TypeRef and TypeDef tables. Rows are decoded lazily on
/// access.
///
/// ## Table Access
/// ```rust,no_run
/// use nsscope::metadata::{streams::TablesHeader, tables::{TableId, TypeDefRaw}};
///
/// # fn example(tables_header: &TablesHeader) -> nsscope::Result<()> {
/// if let Some(typedefs) = tables_header.table::<TypeDefRaw>() {
///     println!("TypeDef table has {} rows", typedefs.row_count());
///
///     // rows are 1-based, row 1 is `<Module>`
///     for type_def in typedefs.iter().skip(1).take(5) {
///         println!("flags={:#x} name_idx={} namespace_idx={}",
///                  type_def.flags, type_def.type_name, type_def.type_namespace);
///     }
/// }
///
/// for summary in tables_header.table_summary() {
///     println!("{:?}: {} rows", summary.table_id, summary.row_count);
/// }
/// # Ok(())
/// # }
/// ```
///
/// ## Reference
/// * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2.6 && II.22
pub struct TablesHeader<'a> {
    /// Major version of table schemata, shall be 2
    pub major_version: u8,
    /// Minor version of table schemata, shall be 0
    pub minor_version: u8,
    /// The `HeapSizes` flags
    pub heap_sizes: HeapSizes,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of sorted tables
    pub sorted: u64,
    /// The extra data word that follows the row counts if [`HeapSizes::EXTRA_DATA`] is set
    pub extra_data: Option<u32>,
    /// Row counts and column widths of every table
    pub info: TableInfoRef,
    /// The offset of the first table, relative to the start of the stream
    tables_offset: usize,
    /// Byte range of every present table within the stream
    ranges: Vec<Option<Range<usize>>>,
    /// Typed views, indexed by [`TableId`]
    tables: Vec<Option<TableData<'a>>>,
}

/// Summary information for a metadata table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    /// The table
    pub table_id: TableId,
    /// Number of rows it declares
    pub row_count: u32,
}

crate::impl_table_access!(ModuleRaw, TableId::Module, Module);
crate::impl_table_access!(TypeRefRaw, TableId::TypeRef, TypeRef);
crate::impl_table_access!(TypeDefRaw, TableId::TypeDef, TypeDef);

impl<'a> TablesHeader<'a> {
    /// Create a `TablesHeader` object from the bytes of the tables stream
    ///
    /// # Arguments
    /// * 'data' - The `#~` or `#-` stream
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedMetadata`] if the stream is truncated, declares no tables
    /// or an unknown table, or if the declared row counts overrun the stream.
    pub fn from(data: &'a [u8]) -> Result<TablesHeader<'a>> {
        Self::parse(data).map_err(|error| match error {
            OutOfBounds => malformed_error!("Tables stream of {} bytes is truncated", data.len()),
            other => other,
        })
    }

    fn parse(data: &'a [u8]) -> Result<TablesHeader<'a>> {
        if data.len() < 24 {
            return Err(OutOfBounds);
        }

        let valid = read_le::<u64>(&data[8..])?;
        if valid == 0 {
            return Err(malformed_error!("No valid rows in any of the tables"));
        }

        let unknown = valid & !TableId::KNOWN_MASK;
        if unknown != 0 {
            return Err(malformed_error!(
                "Tables stream declares unknown tables - 0x{:016X}",
                unknown
            ));
        }

        let heap_sizes = HeapSizes::from_bits_retain(data[6]);
        let info = Arc::new(TableInfo::new(data, valid)?);

        let mut offset = 24 + valid.count_ones() as usize * 4;
        let extra_data = if heap_sizes.contains(HeapSizes::EXTRA_DATA) {
            let extra = read_le_at::<u32>(data, &mut offset)?;
            log::warn!("Tables stream carries an extra data word - 0x{:08X}", extra);
            Some(extra)
        } else {
            None
        };

        let mut tables_header = TablesHeader {
            major_version: read_le::<u8>(&data[4..])?,
            minor_version: read_le::<u8>(&data[5..])?,
            heap_sizes,
            valid,
            sorted: read_le::<u64>(&data[16..])?,
            extra_data,
            info,
            tables_offset: offset,
            ranges: vec![None; TableId::COUNT],
            tables: Vec::with_capacity(TableId::COUNT),
        };
        tables_header.tables.resize_with(TableId::COUNT, || None);

        for table_id in TableId::iter() {
            if !table_id.is_set(valid) {
                continue;
            }

            offset = tables_header.add_table(data, table_id, offset)?;
        }

        log::debug!(
            "Tables stream v{}.{}: {} tables, {} of {} bytes used",
            tables_header.major_version,
            tables_header.minor_version,
            tables_header.table_count(),
            offset,
            data.len()
        );

        Ok(tables_header)
    }

    /// Record the table `table_id` starting at `offset`, returning the offset behind it
    fn add_table(&mut self, data: &'a [u8], table_id: TableId, offset: usize) -> Result<usize> {
        let rows = self.info.rows(table_id);
        let row_size = match table_id {
            TableId::Module => ModuleRaw::row_size(&self.info),
            TableId::TypeRef => TypeRefRaw::row_size(&self.info),
            TableId::TypeDef => TypeDefRaw::row_size(&self.info),
            _ => table_id.row_size(&self.info),
        };

        let end = offset as u64 + u64::from(rows) * u64::from(row_size);
        if end > data.len() as u64 {
            return Err(malformed_error!(
                "Table {:?} with {} rows of {} bytes at offset {} overruns the stream of {} bytes",
                table_id,
                rows,
                row_size,
                offset,
                data.len()
            ));
        }

        // bounded by data.len() above
        #[allow(clippy::cast_possible_truncation)]
        let end = end as usize;
        let table_bytes = &data[offset..end];

        let view = match table_id {
            TableId::Module => Some(TableData::Module(MetadataTable::new(
                table_bytes,
                rows,
                self.info.clone(),
            )?)),
            TableId::TypeRef => Some(TableData::TypeRef(MetadataTable::new(
                table_bytes,
                rows,
                self.info.clone(),
            )?)),
            TableId::TypeDef => Some(TableData::TypeDef(MetadataTable::new(
                table_bytes,
                rows,
                self.info.clone(),
            )?)),
            _ => None,
        };

        log::trace!("{:?}: {} rows at {}..{}", table_id, rows, offset, end);

        self.tables[table_id as usize] = view;
        self.ranges[table_id as usize] = Some(offset..end);
        Ok(end)
    }

    /// Get the table count
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Get the typed view of a table
    ///
    /// Available for [`ModuleRaw`], [`TypeRefRaw`] and [`TypeDefRaw`]. Returns `None` if the
    /// stream does not contain the table.
    #[must_use]
    pub fn table<T: RowReadable>(&'a self) -> Option<&'a MetadataTable<'a, T>>
    where
        Self: TableAccess<'a, T>,
    {
        <Self as TableAccess<'a, T>>::table(self)
    }

    /// Check if a specific table is present
    #[must_use]
    pub fn has_table(&self, table_id: TableId) -> bool {
        table_id.is_set(self.valid)
    }

    /// Check if a table is present by its numeric ID, `false` for IDs above 63
    #[must_use]
    pub fn has_table_by_id(&self, table_id: u8) -> bool {
        if table_id > 63 {
            return false;
        }
        (self.valid & (1u64 << table_id)) != 0
    }

    /// Get an iterator over all present tables
    pub fn present_tables(&self) -> impl Iterator<Item = TableId> + '_ {
        TableId::iter().filter(|&table_id| self.has_table(table_id))
    }

    /// Get the row count for a specific table, 0 if it is not present
    #[must_use]
    pub fn table_rows(&self, table_id: TableId) -> u32 {
        self.info.rows(table_id)
    }

    /// Byte range of a table within the stream
    #[must_use]
    pub fn table_range(&self, table_id: TableId) -> Option<Range<usize>> {
        self.ranges[table_id as usize].clone()
    }

    /// Offset of the first table within the stream
    #[must_use]
    pub fn tables_offset(&self) -> usize {
        self.tables_offset
    }

    /// Get a summary of all present tables with their row counts
    #[must_use]
    pub fn table_summary(&self) -> Vec<TableSummary> {
        self.present_tables()
            .map(|table_id| TableSummary {
                table_id,
                row_count: self.table_rows(table_id),
            })
            .collect()
    }

    /// Check every heap and table index of the Module, TypeRef and TypeDef rows.
    ///
    /// String indices must lie inside `strings`, GUID indices inside `guids` (0 is always
    /// allowed), coded indices must carry a valid tag and point at an existing row (or be null),
    /// and the `FieldList`/`MethodList` columns may be at most one past the last row of their
    /// target table.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRangeIndex`] for the first violation.
    pub fn validate_rows(&'a self, strings: &Strings<'_>, guids: Option<&Guid<'_>>) -> Result<()> {
        if let Some(modules) = self.table::<ModuleRaw>() {
            for rid in 1..=modules.row_count() {
                let row = modules.try_get(rid)?;
                check_string(strings, row.name, TableId::Module, rid, "Name")?;
                check_guid(guids, row.mvid, rid, "Mvid")?;
                check_guid(guids, row.encid, rid, "EncId")?;
                check_guid(guids, row.encbaseid, rid, "EncBaseId")?;
            }
        }

        if let Some(typerefs) = self.table::<TypeRefRaw>() {
            for rid in 1..=typerefs.row_count() {
                let row = typerefs.try_get(rid)?;
                let table = TableId::TypeRef;
                self.check_coded(&row.resolution_scope, table, rid, "ResolutionScope")?;
                check_string(strings, row.type_name, table, rid, "TypeName")?;
                check_string(strings, row.type_namespace, table, rid, "TypeNamespace")?;
            }
        }

        if let Some(typedefs) = self.table::<TypeDefRaw>() {
            for rid in 1..=typedefs.row_count() {
                let row = typedefs.try_get(rid)?;
                let table = TableId::TypeDef;
                check_string(strings, row.type_name, table, rid, "TypeName")?;
                check_string(strings, row.type_namespace, table, rid, "TypeNamespace")?;
                self.check_coded(&row.extends, table, rid, "Extends")?;

                self.check_list(row.field_list, TableId::Field, rid, "FieldList")?;
                self.check_list(row.method_list, TableId::MethodDef, rid, "MethodList")?;
            }
        }

        Ok(())
    }

    fn check_coded(
        &self,
        index: &CodedIndex,
        table: TableId,
        rid: u32,
        column: &str,
    ) -> Result<()> {
        let rows = self.info.rows(index.tag);
        if index.row > rows {
            return Err(out_of_range_error!(
                "{:?} row {} column {} references {:?} row {} of {}",
                table,
                rid,
                column,
                index.tag,
                index.row,
                rows
            ));
        }

        Ok(())
    }

    /// A list column points into the `*Ptr` table of `direct` if the stream has one
    fn check_list(&self, value: u32, direct: TableId, rid: u32, column: &str) -> Result<()> {
        let indirect = match direct {
            TableId::Field => TableId::FieldPtr,
            TableId::MethodDef => TableId::MethodPtr,
            other => other,
        };
        let target = if self.has_table(indirect) {
            indirect
        } else {
            direct
        };

        let limit = u64::from(self.info.rows(target)) + 1;
        if u64::from(value) > limit {
            return Err(out_of_range_error!(
                "TypeDef row {} column {} references {:?} row {}, limit is {}",
                rid,
                column,
                target,
                value,
                limit
            ));
        }

        Ok(())
    }
}

fn check_string(
    strings: &Strings<'_>,
    index: u32,
    table: TableId,
    rid: u32,
    column: &str,
) -> Result<()> {
    if strings.contains(index as usize) {
        return Ok(());
    }

    Err(out_of_range_error!(
        "{:?} row {} column {} references #Strings offset {} outside of heap with {} bytes",
        table,
        rid,
        column,
        index,
        strings.len()
    ))
}

fn check_guid(guids: Option<&Guid<'_>>, index: u32, rid: u32, column: &str) -> Result<()> {
    let present = match guids {
        Some(guids) => guids.contains(index as usize),
        None => index == 0,
    };

    if present {
        return Ok(());
    }

    Err(out_of_range_error!(
        "Module row {} column {} references #GUID index {} outside of heap",
        rid,
        column,
        index
    ))
}
