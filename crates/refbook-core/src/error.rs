//! Error types for refbook-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed lower-level cause carried by [`Error::SourceOpenFailure`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while parsing sheets and resolving references
#[derive(Debug, Error)]
pub enum Error {
    /// A raw cell could not be converted to its declared column type,
    /// or a column type tag is not recognized
    #[error("cannot parse {raw:?} as {column_type:?}: {reason}")]
    ParseFailure {
        column_type: String,
        raw: String,
        reason: String,
    },

    /// Named column lookup miss on a sheet
    #[error("sheet:{sheet} column:{column} not found")]
    ColumnNotFound { sheet: String, column: String },

    /// A polymorphic row names a reference alias that no definition carries
    #[error("sheet:{sheet} row:{row} column:{column} reference_name:{alias} not found")]
    AliasNotFound {
        sheet: String,
        row: usize,
        column: String,
        alias: String,
    },

    /// A key present in a row is absent from the reference's value map
    #[error(
        "sheet:{sheet} row:{row} column:{column} reference:{raw} value not found from {reference_sheet}:{reference_key}"
    )]
    ValueNotFound {
        sheet: String,
        row: usize,
        column: String,
        raw: String,
        reference_sheet: String,
        reference_key: String,
    },

    /// A column's settled type conflicts with a newly resolved value type
    #[error("sheet:{sheet} row:{row} column:{column} value type mismatch: {declared}, {resolved}")]
    TypeMismatch {
        sheet: String,
        row: usize,
        column: String,
        declared: String,
        resolved: String,
    },

    /// A polymorphic definition whose consuming sheet and reference sheet differ
    #[error("polymorphic reference sheet({sheet}) and reference_sheet({reference_sheet}) must match")]
    DefinitionInvariantViolation {
        sheet: String,
        reference_sheet: String,
    },

    /// A header of the reference-definition sheet is not a known field
    #[error("unknown reference definition column: {0}")]
    UnknownDefinitionHeader(String),

    /// Underlying workbook or file I/O failure
    #[error("cannot open {source_name}")]
    SourceOpenFailure {
        source_name: String,
        #[source]
        source: BoxError,
    },

    /// Invalid cell coordinate or A1 address
    #[error("invalid cell address: {0}")]
    Address(String),
}

impl Error {
    /// Wrap a storage-level failure for the named workbook or sheet
    pub fn source_open<S, E>(source_name: S, source: E) -> Self
    where
        S: Into<String>,
        E: Into<BoxError>,
    {
        Error::SourceOpenFailure {
            source_name: source_name.into(),
            source: source.into(),
        }
    }

    pub(crate) fn parse_failure(
        column_type: impl Into<String>,
        raw: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Error::ParseFailure {
            column_type: column_type.into(),
            raw: raw.into(),
            reason: reason.to_string(),
        }
    }
}
