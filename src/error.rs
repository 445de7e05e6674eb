//! Defines [`StacFormatError`], representing all errors returned by this crate.

use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StacFormatError {
    /// Record text could not be decoded at all.
    #[error("Failed to decode record: {0}")]
    Decode(#[source] serde_json::Error),

    /// A textual geometry could not be decoded into a structured value.
    #[error("Failed to parse geometry string: {0}")]
    GeometryDecode(#[source] serde_json::Error),

    /// A format name was registered twice.
    #[error("Format already registered: {0}")]
    DuplicateFormat(String),

    /// No format is registered under this name.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// Not one of `json`, `yaml`, `toml` or `frontmatter`.
    #[error("Unknown serialization kind: {0}")]
    UnknownSerializationKind(String),

    /// Rejected by [`StacFormatOptions::validate`](crate::StacFormatOptions::validate).
    #[error("Invalid format options: {0}")]
    InvalidOptions(String),
}

/// Crate-specific result type.
pub type StacFormatResult<T> = std::result::Result<T, StacFormatError>;
