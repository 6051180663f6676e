//! Metadata parsing for .NET assemblies.
//!
//! Loading runs bottom-up through these modules:
//!
//! - [`cor20header`] - the CLI header the CLR runtime directory points at
//! - [`root`] - the metadata root signature, version string and stream directory
//! - [`streams`] - the `#Strings`, `#US`, `#GUID` and `#Blob` heaps and the `#~` tables stream
//! - [`metadataroot`] - binds the streams of an image to their views
//! - [`tables`] - table identifiers, coded indexes, row layouts and the typed rows
//! - [`types`] - lazy enumeration of defined and referenced types
//! - [`view`] - [`view::AssemblyView`], which owns an image and ties all of the above together
//! - [`token`] - metadata table row references
//!
//! # Examples
//!
//! ```rust,no_run
//! use nsscope::metadata::view::AssemblyView;
//!
//! let view = AssemblyView::from_file("tests/samples/Sample.dll".as_ref())?;
//! for summary in view.tables().table_summary() {
//!     println!("{:?}: {} rows", summary.table_id, summary.row_count);
//! }
//! # Ok::<(), nsscope::Error>(())
//! ```

/// Implementation of the Header of CIL
pub mod cor20header;
/// Binding of the metadata streams of a loaded image
pub mod metadataroot;
/// Implementation of the root metadata structure
pub mod root;
/// Implementation of all metadata streams (tables, heaps, etc.)
pub mod streams;
/// Implementation of the .NET metadata tables
pub mod tables;
/// Commonly used metadata token type
pub mod token;
/// Decoded types and the iterators producing them
pub mod types;
/// The loaded assembly
pub mod view;
