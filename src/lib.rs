// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # nsscope
//!
//! Reads the names and namespaces of the types defined in a .NET PE assembly, straight from
//! the ECMA-335 metadata and without a .NET runtime.
//!
//! Loading walks the image in four stages, each of which rejects damaged input with its own
//! [`Error`] kind:
//!
//! 1. **PE container** ([`File`]) - DOS/PE headers, sections, RVA mapping, the CLR directory
//! 2. **Metadata streams** ([`metadata::metadataroot::MetadataRoot`]) - CLI header, metadata
//!    root, `#~`/`#-`, `#Strings`, `#US`, `#GUID`, `#Blob`
//! 3. **Tables** ([`TablesHeader`]) - row counts, column widths, row layout and index checks
//! 4. **Types** ([`TypeIterator`]) - lazy `(name, namespace)` pairs in table order,
//!    without the `<Module>` pseudo-type
//!
//! [`AssemblyView`] runs all of them and keeps the result. Which namespaces matter is left to
//! the caller; [`NamespaceFilter`] and [`NamespaceTally`] implement the usual policy of dropping
//! `System` and the empty namespace.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nsscope::prelude::*;
//! use std::path::Path;
//!
//! let view = AssemblyView::from_file(Path::new("MyLibrary.dll"))?;
//!
//! let mut tally = NamespaceTally::new();
//! tally.add_types(&view, &NamespaceFilter::default())?;
//!
//! for (namespace, count) in tally.iter() {
//!     println!("{namespace}\t{count}");
//! }
//! # Ok::<(), nsscope::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]. Errors are detected while loading, so a
//! constructed [`AssemblyView`] only fails on lookups of individual rows:
//!
//! ```rust,no_run
//! use nsscope::{AssemblyView, Error};
//!
//! match AssemblyView::from_mem(std::fs::read("MyLibrary.dll")?) {
//!     Ok(view) => println!("{} types", view.types().len()),
//!     Err(error) if error.is_malformed() => eprintln!("rejected: {error}"),
//!     Err(error) => return Err(error.into()),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Input handling: owned buffers, memory-mapped files and the PE container on top of them.
pub mod file;

/// Namespace filtering and counting on top of any [`metadata::types::TypeSource`].
pub mod filter;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use nsscope::prelude::*;
///
/// let view = AssemblyView::from_file("MyLibrary.dll".as_ref())?;
/// println!("{} types", view.types().len());
/// # Ok::<(), nsscope::Error>(())
/// ```
pub mod prelude;

/// Definitions, parsing and loading of CIL metadata based on ECMA-335.
///
/// # Key Components
///
/// - [`metadata::cor20header`] - CLI header
/// - [`metadata::root`] - metadata root and stream directory
/// - [`metadata::streams`] - heaps and the tables stream
/// - [`metadata::tables`] - table identifiers, coded indexes and typed rows
/// - [`metadata::types`] - decoded types and their iterators
/// - [`metadata::view`] - the loaded assembly
pub mod metadata;

/// `nsscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;

/// Owner of a loaded assembly. See [`metadata::view::AssemblyView`].
pub use metadata::view::AssemblyView;

pub use metadata::{
    streams::{Blob, Guid, StreamHeader, Strings, TablesHeader, UserStrings},
    token::Token,
    types::{DecodedType, DecodedTypeRef, TypeIterator, TypeRefIterator, TypeSource},
};

pub use file::{parser::Parser, File};

pub use filter::{NamespaceFilter, NamespaceTally};
