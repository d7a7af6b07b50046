//! Error types for PPTX conversion.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting presentations.
///
/// `Open`, `Encrypted` and `Xml` are open-class failures: the input could
/// not be loaded as a presentation. `Write` means the converted document
/// could not be committed to the output path. Both classes are recorded
/// per file by the batch driver, which then continues with the next file.
/// `MappingTable` is fatal: without the conversion table no file can be
/// converted, so it aborts the run before any file is touched.
#[derive(Error, Debug)]
pub enum Error {
    /// The input file is missing, not a ZIP container, or structurally broken.
    #[error("failed to open presentation: {0}")]
    Open(String),

    /// The file is an OLE/CFB container, i.e. a password-protected OOXML
    /// document (or a legacy binary format). Explicitly unsupported.
    #[error("encrypted or legacy presentation is not supported: {0}")]
    Encrypted(String),

    /// A part inside the package contains malformed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// The output path could not be written.
    #[error("failed to write output: {0}")]
    Write(String),

    /// The bundled character-mapping table failed to load.
    #[error("conversion table error: {0}")]
    MappingTable(String),
}
