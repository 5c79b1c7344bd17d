//! CLI error type.

use std::{io, path::PathBuf};

use imagebytes_proto::{CodecError, ElementKind};
use thiserror::Error;

/// Failures of a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Input file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Output file could not be written
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File that was written
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Report could not be written to stdout
    #[error("output error: {0}")]
    Output(#[from] io::Error),

    /// Encoding or decoding failed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Pattern maximum is not representable in the chosen kind
    #[error("maximum value {max} does not fit {kind}")]
    MaxOutOfRange {
        /// Requested maximum
        max: u64,
        /// Pattern element kind
        kind: ElementKind,
    },

    /// Pattern kind has no concrete element type
    #[error("cannot synthesize {0} elements")]
    UnsupportedKind(ElementKind),

    /// Pattern dimensions are inconsistent
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
