//! # Metadata Table Types Module
//!
//! Generic infrastructure shared by every metadata table: typed views over the raw row bytes,
//! the row-reading trait, table identifiers, coded indices and the column width calculation.
//!
//! ## Key Components
//!
//! - [`MetadataTable`]: Typed view over the rows of one table, decoding them on access
//! - [`RowReadable`]: How a row type is sized and read
//! - [`TableIterator`]: Sequential iterator over table rows
//! - [`CodedIndex`] and [`CodedIndexType`]: Compact cross-table references
//! - [`TableId`]: Enumeration of all metadata table types
//! - [`TableInfo`] and [`TableInfoRef`]: Row counts and column widths
//! - [`TableData`]: The tables a [`crate::metadata::streams::TablesHeader`] keeps typed views for
//!
//! ## Usage Example
//!
//! ```rust
//! use nsscope::metadata::tables::{MetadataTable, RowReadable, TableInfo, TableInfoRef};
//! use std::sync::Arc;
//!
//! struct ExampleRow { rid: u32, value: u16 }
//!
//! impl RowReadable for ExampleRow {
//!     fn row_size(_: &TableInfoRef) -> u32 { 2 }
//!     fn row_read(data: &[u8], offset: &mut usize, rid: u32, _: &TableInfoRef) -> nsscope::Result<Self> {
//!         let value = nsscope::file::io::read_le_at::<u16>(data, offset)?;
//!         Ok(ExampleRow { rid, value })
//!     }
//! }
//!
//! let data = [0x01, 0x00, 0x02, 0x00];
//! let table = MetadataTable::<ExampleRow>::new(&data, 2, Arc::new(TableInfo::default()))?;
//! for row in &table {
//!     println!("Row {}: {}", row.rid, row.value);
//! }
//! assert_eq!(table.get(2).map(|row| row.value), Some(2));
//! # Ok::<(), nsscope::Error>(())
//! ```

mod codedindex;
mod tableid;
mod tableinfo;

use std::marker::PhantomData;

use crate::{Error::OutOfBounds, Result};

pub use codedindex::{CodedIndex, CodedIndexType, CodedIndexTypeIter};
pub use tableid::{TableId, TableIdIter};
pub use tableinfo::{HeapSizes, TableInfo, TableInfoRef, TableRowInfo};

use crate::metadata::tables::{ModuleRaw, TypeDefRaw, TypeRefRaw};

/// A row type that can be decoded from a metadata table.
///
/// Column widths vary per assembly, so both operations receive the [`TableInfoRef`] of the
/// stream the table belongs to.
pub trait RowReadable: Sized + Send {
    /// Size of one row in bytes, given the column widths in `sizes`
    fn row_size(sizes: &TableInfoRef) -> u32;

    /// Read the row `rid` at `offset`, advancing `offset` past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` ends inside the row, and
    /// [`crate::Error::OutOfRangeIndex`] if a coded index carries an invalid tag.
    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self>;
}

/// Typed access to the tables a [`crate::metadata::streams::TablesHeader`] holds views for.
pub trait TableAccess<'a, T: RowReadable> {
    /// The view of table `T`, or `None` if the stream does not contain it.
    fn table(&'a self) -> Option<&'a MetadataTable<'a, T>>;
}

/// Implements [`TableAccess`] for a row type stored in a [`TableData`] variant.
#[macro_export]
macro_rules! impl_table_access {
    ($raw:ty, $id:expr, $variant:ident) => {
        impl<'a> TableAccess<'a, $raw> for TablesHeader<'a> {
            fn table(&'a self) -> Option<&'a MetadataTable<'a, $raw>> {
                match self.tables.get($id as usize)? {
                    Some(TableData::$variant(table)) => Some(table),
                    _ => None,
                }
            }
        }
    };
}

/// The tables that get typed views. All other tables are sized and skipped.
pub enum TableData<'a> {
    /// The `Module` table
    Module(MetadataTable<'a, ModuleRaw>),
    /// The `TypeRef` table
    TypeRef(MetadataTable<'a, TypeRefRaw>),
    /// The `TypeDef` table
    TypeDef(MetadataTable<'a, TypeDefRaw>),
}

/// A view over the rows of one metadata table.
///
/// Rows are decoded on every access; nothing is cached.
pub struct MetadataTable<'a, T> {
    data: &'a [u8],
    row_count: u32,
    row_size: u32,
    sizes: TableInfoRef,
    _phantom: PhantomData<T>,
}

impl<'a, T: RowReadable> MetadataTable<'a, T> {
    /// Create a view over `row_count` rows at the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than the rows need.
    pub fn new(data: &'a [u8], row_count: u32, sizes: TableInfoRef) -> Result<Self> {
        let row_size = T::row_size(&sizes);
        if (data.len() as u64) < u64::from(row_count) * u64::from(row_size) {
            return Err(OutOfBounds);
        }

        Ok(MetadataTable {
            data,
            row_count,
            row_size,
            sizes,
            _phantom: PhantomData,
        })
    }

    /// Size of the table in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(self.row_count) * u64::from(self.row_size)
    }

    /// Size of one row in bytes
    #[must_use]
    pub fn row_size(&self) -> u32 {
        self.row_size
    }

    /// Number of rows
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    /// The column widths this table was sized with
    #[must_use]
    pub fn sizes(&self) -> &TableInfoRef {
        &self.sizes
    }

    /// Get the row with the 1-based `index`, `None` if it does not exist or cannot be decoded.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<T> {
        self.try_get(index).ok()
    }

    /// Get the row with the 1-based `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRangeIndex`] if `index` is 0 or past the last row, and the
    /// errors of [`RowReadable::row_read`].
    pub fn try_get(&self, index: u32) -> Result<T> {
        if index == 0 || self.row_count < index {
            return Err(out_of_range_error!(
                "Row {} outside of table with {} rows",
                index,
                self.row_count
            ));
        }

        T::row_read(
            self.data,
            &mut ((index as usize - 1) * self.row_size as usize),
            index,
            &self.sizes,
        )
    }

    /// Iterate over all rows in table order. Iteration ends at the first row that fails to
    /// decode; rows of a validated stream always decode.
    #[must_use]
    pub fn iter(&'a self) -> TableIterator<'a, T> {
        TableIterator {
            table: self,
            current_row: 0,
            current_offset: 0,
        }
    }
}

impl<'a, T: RowReadable> IntoIterator for &'a MetadataTable<'a, T> {
    type Item = T;
    type IntoIter = TableIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Sequential iterator over the rows of a [`MetadataTable`]
pub struct TableIterator<'a, T> {
    table: &'a MetadataTable<'a, T>,
    current_row: u32,
    current_offset: usize,
}

impl<'a, T: RowReadable> Iterator for TableIterator<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.table.row_count {
            return None;
        }

        match T::row_read(
            self.table.data,
            &mut self.current_offset,
            self.current_row + 1,
            &self.table.sizes,
        ) {
            Ok(row) => {
                self.current_row += 1;
                Some(row)
            }
            Err(error) => {
                log::warn!(
                    "Stopping iteration at row {} - {}",
                    self.current_row + 1,
                    error
                );
                self.current_row = self.table.row_count;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.table.row_count - self.current_row) as usize;
        (0, Some(remaining))
    }
}
