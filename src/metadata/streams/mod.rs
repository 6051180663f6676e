//! Metadata streams for .NET assemblies.
//!
//! The metadata root (see [`crate::metadata::root::Root`]) is followed by a directory of named
//! streams. This module holds the stream header and a read-only view type for each stream kind:
//!
//! - **`#Strings`** ([`Strings`]) - UTF-8 identifier heap with type names, namespaces and member
//!   names. Offset 0 is always the empty string.
//! - **`#US`** ([`UserStrings`]) - UTF-16 string literals used by IL code.
//! - **`#Blob`** ([`Blob`]) - length-prefixed binary data such as signatures.
//! - **`#GUID`** ([`Guid`]) - 16-byte GUIDs, indexed from 1.
//! - **`#~`** / **`#-`** ([`TablesHeader`]) - the metadata tables, compressed or uncompressed.
//!
//! # Examples
//!
//! ```rust,no_run
//! use nsscope::AssemblyView;
//!
//! let view = AssemblyView::from_file("tests/samples/crafted.dll".as_ref())?;
//! let strings = view.strings();
//! println!("module: {}", strings.get(1)?);
//! println!("{} tables present", view.tables().table_count());
//! # Ok::<(), nsscope::Error>(())
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 24.2.2 - Stream Headers
//! - ECMA-335 6th Edition, Partition II, Section 24.2.6 - `#~` stream

mod blob;
mod guid;
mod streamheader;
mod strings;
mod tablesheader;
mod userstrings;

pub use blob::{Blob, BlobIterator};
pub use guid::Guid;
pub use streamheader::StreamHeader;
pub use strings::Strings;
pub use tablesheader::{TableSummary, TablesHeader};
pub use userstrings::UserStrings;
