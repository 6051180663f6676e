use thiserror::Error;

/// Builds an [`Error::MalformedMetadata`] that records where it was raised.
macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::MalformedMetadata {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedMetadata {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Builds an [`Error::MalformedImage`] that records where it was raised.
macro_rules! malformed_image {
    ($msg:expr) => {
        crate::Error::MalformedImage {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedImage {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Builds an [`Error::OutOfRangeIndex`] that records where it was raised.
macro_rules! out_of_range_error {
    ($msg:expr) => {
        crate::Error::OutOfRangeIndex {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::OutOfRangeIndex {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Loading an assembly runs in stages (PE container, metadata root, tables, row validation) and
/// every stage reports its failures with the variant that names what was wrong with the input:
///
/// - [`Error::MalformedImage`] - the PE container itself is broken or not a managed image
/// - [`Error::MalformedMetadata`] - the CLI metadata is truncated, inconsistent or missing parts
/// - [`Error::OutOfRangeIndex`] - a decoded row references a heap offset or row that does not exist
///
/// [`Error::OutOfBounds`] is the low-level read failure of the byte cursors. The loaders translate
/// it into the malformed kind of the stage it happened in, so [`crate::AssemblyView::from_mem`]
/// and [`crate::AssemblyView::from_file`] never surface it.
///
/// # Examples
///
/// ```rust,no_run
/// use nsscope::{AssemblyView, Error};
/// use std::path::Path;
///
/// match AssemblyView::from_file(Path::new("assembly.dll")) {
///     Ok(view) => println!("{} types", view.types().count()),
///     Err(Error::MalformedImage { message, .. }) => eprintln!("not a managed PE: {message}"),
///     Err(Error::MalformedMetadata { message, file, line }) => {
///         eprintln!("broken metadata: {message} ({file}:{line})")
///     }
///     Err(error) => eprintln!("{error}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The PE container could not be parsed, or it is not a managed assembly.
    ///
    /// Raised for bad MZ/PE signatures, a missing optional header, an inconsistent section
    /// table, RVAs that no section maps, and a missing or invalid CLR header.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed image - {file}:{line}: {message}")]
    MalformedImage {
        /// The message to be printed for the MalformedImage error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The CLI metadata is damaged and could not be parsed.
    ///
    /// Raised for a bad metadata root signature, a missing `#~`/`#-` table stream or `#Strings`
    /// heap, stream ranges outside the metadata block, row counts that overrun the table stream,
    /// and images that end before the metadata they declare.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed metadata - {file}:{line}: {message}")]
    MalformedMetadata {
        /// The message to be printed for the MalformedMetadata error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A heap offset or table row index in a decoded row lies outside its heap or table.
    #[error("Index out of range - {file}:{line}: {message}")]
    OutOfRangeIndex {
        /// The message to be printed for the OutOfRangeIndex error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    ///
    /// This error occurs when trying to read data beyond the end of a buffer. It's a safety check
    /// to prevent buffer overruns during parsing.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while opening or mapping an assembly from disk.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for the three input-validation kinds, as opposed to I/O and empty input.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::MalformedImage { .. }
                | Error::MalformedMetadata { .. }
                | Error::OutOfRangeIndex { .. }
        )
    }
}
