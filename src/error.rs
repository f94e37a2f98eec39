//! Error types for lhpdf.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for lhpdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reconstructing a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input path does not exist.
    #[error("PDF file not found: {0}")]
    FileNotFound(PathBuf),

    /// The input path does not carry a `.pdf` extension.
    #[error("File is not a PDF: {0}")]
    NotPdfExtension(PathBuf),

    /// The file content is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and cannot be read.
    #[error("Document is encrypted")]
    Encrypted,

    /// The document opened but has no pages.
    #[error("Document has no pages")]
    EmptyDocument,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// A table detection strategy failed.
    #[error("Table extraction error ({flavor}): {message}")]
    TableExtract { flavor: String, message: String },

    /// Two tables could not be merged.
    #[error("Table merge error: {0}")]
    TableMerge(String),

    /// Error during serialization.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl Error {
    /// Whether this error means the input itself is unusable.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound(_)
                | Error::NotPdfExtension(_)
                | Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::EmptyDocument
                | Error::Encrypted
        )
    }
}
