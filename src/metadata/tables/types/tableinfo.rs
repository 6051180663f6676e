//! Row counts and column widths of one tables stream.
//!
//! Every index column in the metadata tables is either 2 or 4 bytes wide, depending on the heap
//! size flags and on how many rows the referenced tables hold. [`TableInfo`] computes these widths
//! once per load; every row reader asks it instead of recomputing them.

use std::sync::Arc;

use bitflags::bitflags;
use strum::{EnumCount, IntoEnumIterator};

use crate::{
    file::io::read_le_at,
    metadata::tables::types::{CodedIndexType, TableId},
    Error::OutOfBounds,
    Result,
};

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    /// The `HeapSizes` byte of the tables stream header
    pub struct HeapSizes : u8 {
        /// `#Strings` indices are 4 bytes wide
        const LARGE_STRINGS = 0x01;
        /// `#GUID` indices are 4 bytes wide
        const LARGE_GUID = 0x02;
        /// `#Blob` indices are 4 bytes wide
        const LARGE_BLOB = 0x04;
        /// Set by some compilers in unoptimized metadata, no layout effect
        const PADDING_BIT = 0x08;
        /// The stream holds only edit-and-continue deltas
        const DELTA_ONLY = 0x20;
        /// A 4-byte extra data word follows the row counts
        const EXTRA_DATA = 0x40;
        /// Rows may be marked as deleted
        const HAS_DELETE = 0x80;
    }
}

/// Row count and index width of one table
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// Number of rows
    pub rows: u32,
    /// Bits needed to address every row, at least 1
    pub bits: u8,
    /// Indices into this table are 4 bytes wide
    pub is_large: bool,
}

impl TableRowInfo {
    /// Derive the index width for a table with `rows` rows
    #[must_use]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            // 32 - leading_zeros is at most 32
            #[allow(clippy::cast_possible_truncation)]
            let bits = (32 - rows.leading_zeros()) as u8;
            bits
        };

        Self {
            rows,
            bits,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// Column width information for one tables stream
#[derive(Clone, Default, Debug)]
pub struct TableInfo {
    rows: Vec<TableRowInfo>,
    coded_indexes: Vec<u8>,
    heap_sizes: HeapSizes,
}

/// Shared handle to a [`TableInfo`], held by every table view
pub type TableInfoRef = Arc<TableInfo>;

impl TableInfo {
    /// Read the row counts that start at offset 24 of the tables stream.
    ///
    /// ## Arguments
    /// * 'data'         - The tables stream
    /// * 'valid_bitvec' - The `valid` vector; one u32 row count follows per set bit
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the stream ends inside the row counts.
    pub fn new(data: &[u8], valid_bitvec: u64) -> Result<Self> {
        let mut table_info = vec![TableRowInfo::default(); TableId::COUNT];
        let mut next_row_offset = 24;

        for table_id in TableId::iter() {
            if !table_id.is_set(valid_bitvec) {
                continue;
            }

            let row_count = read_le_at::<u32>(data, &mut next_row_offset)?;
            table_info[table_id as usize] = TableRowInfo::new(row_count);
        }

        let Some(heap_sizes) = data.get(6) else {
            return Err(OutOfBounds);
        };

        let mut table_info = TableInfo {
            rows: table_info,
            coded_indexes: vec![0; CodedIndexType::COUNT],
            heap_sizes: HeapSizes::from_bits_retain(*heap_sizes),
        };

        table_info.calculate_coded_index_bits();

        Ok(table_info)
    }

    /// Builds a `TableInfo` from explicit row counts and heap-size flags (test-only helper).
    #[cfg(test)]
    pub fn new_test(
        valid_tables: &[(TableId, u32)],
        large_str: bool,
        large_blob: bool,
        large_guid: bool,
    ) -> Self {
        let mut heap_sizes = HeapSizes::empty();
        heap_sizes.set(HeapSizes::LARGE_STRINGS, large_str);
        heap_sizes.set(HeapSizes::LARGE_BLOB, large_blob);
        heap_sizes.set(HeapSizes::LARGE_GUID, large_guid);

        let mut table_info = TableInfo {
            rows: vec![TableRowInfo::default(); TableId::COUNT],
            coded_indexes: vec![0; CodedIndexType::COUNT],
            heap_sizes,
        };

        for valid_table in valid_tables {
            table_info.rows[valid_table.0 as usize] = TableRowInfo::new(valid_table.1);
        }

        table_info.calculate_coded_index_bits();
        table_info
    }

    /// Split a raw coded index into its table and row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRangeIndex`] if the tag selects no table.
    pub fn decode_coded_index(
        &self,
        value: u32,
        coded_index_type: CodedIndexType,
    ) -> Result<(TableId, u32)> {
        let tables = coded_index_type.tables();
        let tag_bits = coded_index_type.tag_bits();
        let tag_mask = (1 << tag_bits) - 1;

        let tag = value & tag_mask;
        let index = value >> tag_bits;

        match tables.get(tag as usize) {
            Some(table) => Ok((*table, index)),
            None => Err(out_of_range_error!(
                "Invalid tag {} for coded index {:?}",
                tag,
                coded_index_type
            )),
        }
    }

    /// The raw heap size flags
    #[must_use]
    pub fn heap_sizes(&self) -> HeapSizes {
        self.heap_sizes
    }

    /// Returns `true` if indexes into `id` need 4 bytes
    #[must_use]
    pub fn is_large(&self, id: TableId) -> bool {
        self.rows[id as usize].is_large
    }

    /// Returns `true` if `#Strings` indexes are 4 bytes wide
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.heap_sizes.contains(HeapSizes::LARGE_STRINGS)
    }

    /// Returns `true` if `#GUID` indexes are 4 bytes wide
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.heap_sizes.contains(HeapSizes::LARGE_GUID)
    }

    /// Returns `true` if `#Blob` indexes are 4 bytes wide
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.heap_sizes.contains(HeapSizes::LARGE_BLOB)
    }

    /// Width of a `#Strings` index column
    #[must_use]
    pub fn str_bytes(&self) -> u8 {
        if self.is_large_str() {
            4
        } else {
            2
        }
    }

    /// Width of a `#GUID` index column
    #[must_use]
    pub fn guid_bytes(&self) -> u8 {
        if self.is_large_guid() {
            4
        } else {
            2
        }
    }

    /// Width of a `#Blob` index column
    #[must_use]
    pub fn blob_bytes(&self) -> u8 {
        if self.is_large_blob() {
            4
        } else {
            2
        }
    }

    /// Row count and index width of `table`
    #[must_use]
    pub fn get(&self, table: TableId) -> &TableRowInfo {
        &self.rows[table as usize]
    }

    /// Number of rows of `table`, 0 if it is absent
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table as usize].rows
    }

    /// Bits needed for a simple index into `table_id`
    #[must_use]
    pub fn table_index_bits(&self, table_id: TableId) -> u8 {
        self.rows[table_id as usize].bits
    }

    /// Width of a simple index column into `table_id`
    #[must_use]
    pub fn table_index_bytes(&self, table_id: TableId) -> u8 {
        if self.rows[table_id as usize].bits > 16 {
            4
        } else {
            2
        }
    }

    /// Bits needed for a coded index of kind `coded_index_type`, tag included
    #[must_use]
    pub fn coded_index_bits(&self, coded_index_type: CodedIndexType) -> u8 {
        self.coded_indexes[coded_index_type as usize]
    }

    /// Width of a coded index column of kind `coded_index_type`
    #[must_use]
    pub fn coded_index_bytes(&self, coded_index_type: CodedIndexType) -> u8 {
        if self.coded_indexes[coded_index_type as usize] > 16 {
            4
        } else {
            2
        }
    }

    fn calculate_coded_index_size(&self, coded_index_type: CodedIndexType) -> u8 {
        let max_bits = coded_index_type
            .tables()
            .iter()
            .map(|table| self.table_index_bits(*table))
            .max()
            .unwrap_or(1);

        max_bits + coded_index_type.tag_bits()
    }

    fn calculate_coded_index_bits(&mut self) {
        for coded_index in CodedIndexType::iter() {
            let size = self.calculate_coded_index_size(coded_index);
            self.coded_indexes[coded_index as usize] = size;
        }
    }
}
