//! Metadata tables of the `#~` (or `#-`) stream.
//!
//! Typed row readers exist for the three tables a namespace inventory needs:
//!
//! - [`ModuleRaw`] (0x00): the module name and version identifier
//! - [`TypeRefRaw`] (0x01): types referenced from other scopes
//! - [`TypeDefRaw`] (0x02): types defined in this module
//!
//! All other tables are described by their column layout only (see [`Column`]), which is enough
//! to compute their size and skip over them.
//!
//! # References
//! - [ECMA-335 II.22: Metadata logical format: tables](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

mod module;
mod schema;
mod typedef;
mod typeref;
mod types;

pub use module::*;
pub use schema::{Column, ColumnType};
pub use typedef::*;
pub use typeref::*;
pub use types::*;
