// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

use snafu::{Location, Snafu};

/// The crate-wide error type.
///
/// Every variant carries the [`Location`] it was raised from, captured at the
/// call site with `snafu::location!()`. Validation variants (`Schema*`,
/// `Blob*`) are raised synchronously before any write has started; the
/// remainder wrap a failure from an external collaborator (filesystem,
/// codec).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("schema is required to create a new space: {message}"))]
    SchemaMissing { message: String, location: Location },

    #[snafu(display("invalid schema: {message}"))]
    SchemaInvalid { message: String, location: Location },

    #[snafu(display("schema mismatch: {message}"))]
    SchemaMismatch { message: String, location: Location },

    #[snafu(display("manifest not found: {message}"))]
    ManifestNotFound { message: String, location: Location },

    #[snafu(display("manifest is corrupt: {message}"))]
    ManifestCorrupt { message: String, location: Location },

    #[snafu(display("blob '{name}' already exists"))]
    BlobAlreadyExists { name: String, location: Location },

    #[snafu(display("blob '{name}' not found"))]
    BlobNotFound { name: String, location: Location },

    #[snafu(display("short write: expected to write {expected} bytes, wrote {actual}"))]
    ShortWrite {
        expected: usize,
        actual: usize,
        location: Location,
    },

    #[snafu(display("IO error: {message}"))]
    IO { message: String, location: Location },

    #[snafu(display("codec error: {message}"))]
    Codec { message: String, location: Location },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn schema_missing(message: impl Into<String>, location: Location) -> Self {
        Self::SchemaMissing {
            message: message.into(),
            location,
        }
    }

    pub fn schema_invalid(message: impl Into<String>, location: Location) -> Self {
        Self::SchemaInvalid {
            message: message.into(),
            location,
        }
    }

    pub fn schema_mismatch(message: impl Into<String>, location: Location) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
            location,
        }
    }

    pub fn manifest_not_found(message: impl Into<String>, location: Location) -> Self {
        Self::ManifestNotFound {
            message: message.into(),
            location,
        }
    }

    pub fn manifest_corrupt(message: impl Into<String>, location: Location) -> Self {
        Self::ManifestCorrupt {
            message: message.into(),
            location,
        }
    }

    pub fn blob_already_exists(name: impl Into<String>, location: Location) -> Self {
        Self::BlobAlreadyExists {
            name: name.into(),
            location,
        }
    }

    pub fn blob_not_found(name: impl Into<String>, location: Location) -> Self {
        Self::BlobNotFound {
            name: name.into(),
            location,
        }
    }

    pub fn short_write(expected: usize, actual: usize, location: Location) -> Self {
        Self::ShortWrite {
            expected,
            actual,
            location,
        }
    }

    pub fn io(message: impl Into<String>, location: Location) -> Self {
        Self::IO {
            message: message.into(),
            location,
        }
    }

    pub fn codec(message: impl Into<String>, location: Location) -> Self {
        Self::Codec {
            message: message.into(),
            location,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string(), snafu::location!())
    }
}

impl From<object_store::Error> for Error {
    fn from(err: object_store::Error) -> Self {
        Self::io(err.to_string(), snafu::location!())
    }
}

impl From<parquet::errors::ParquetError> for Error {
    fn from(err: parquet::errors::ParquetError) -> Self {
        Self::codec(err.to_string(), snafu::location!())
    }
}

impl From<arrow_schema::ArrowError> for Error {
    fn from(err: arrow_schema::ArrowError) -> Self {
        Self::codec(err.to_string(), snafu::location!())
    }
}

impl From<prost::DecodeError> for Error {
    fn from(err: prost::DecodeError) -> Self {
        Self::manifest_corrupt(err.to_string(), snafu::location!())
    }
}

impl From<prost::EncodeError> for Error {
    fn from(err: prost::EncodeError) -> Self {
        Self::manifest_corrupt(err.to_string(), snafu::location!())
    }
}
