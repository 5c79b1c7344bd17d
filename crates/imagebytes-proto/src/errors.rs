//! Codec error types.

use thiserror::Error;

use crate::kind::ElementKind;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Broad classification of a [`CodecError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or truncated buffer. Never recovered.
    Format,
    /// Explicit target kind not reachable from the source kind.
    InvalidKind,
    /// Input array cannot be described by the header.
    InvalidArray,
    /// The producer reported an upstream failure.
    Protocol,
}

/// Errors raised while encoding or decoding ImageBytes buffers.
///
/// All conditions are local and synchronous. Nothing is retried inside the
/// codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Buffer ended before the header or declared data start
    #[error("buffer too short: need {needed} bytes, got {actual}")]
    BufferTooShort {
        /// Bytes required
        needed: usize,
        /// Bytes available
        actual: usize,
    },

    /// Metadata version older than any this codec understands
    #[error("unsupported metadata version {0}")]
    UnsupportedVersion(i32),

    /// Data start does not cover the fixed header
    #[error("invalid data start offset {0}")]
    InvalidDataStart(i32),

    /// Header rank other than 2 or 3
    #[error("invalid rank {0}: expected 2 or 3")]
    InvalidRank(i32),

    /// Unassigned element kind code
    #[error("unknown element kind code {0}")]
    UnknownElementKind(i32),

    /// Dimension field below zero
    #[error("negative dimension {0}")]
    NegativeDimension(i32),

    /// Payload length disagrees with the declared extents
    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    PayloadLengthMismatch {
        /// Length implied by the header
        expected: usize,
        /// Length present
        actual: usize,
    },

    /// Declared payload exceeds the configured limit
    #[error("payload of {size} bytes exceeds limit of {max} bytes")]
    PayloadTooLarge {
        /// Declared payload length
        size: usize,
        /// Configured limit
        max: usize,
    },

    /// Kind has no packed representation
    #[error("{0} cannot be used as a wire element kind")]
    UnsupportedWireKind(ElementKind),

    /// Wire kind does not widen to the logical kind
    #[error("wire kind {wire} does not widen to logical kind {logical}")]
    IncompatibleKinds {
        /// Packed kind
        wire: ElementKind,
        /// Requested kind
        logical: ElementKind,
    },

    /// Element value not representable in the target kind
    #[error("value out of range for {kind}")]
    ValueOutOfRange {
        /// Target kind
        kind: ElementKind,
    },

    /// Explicit target kind is not a safe widening of the source kind
    #[error("cannot encode {from} array as {to}")]
    InvalidKind {
        /// Source kind
        from: ElementKind,
        /// Requested target kind
        to: ElementKind,
    },

    /// Input array rank other than 2 or 3
    #[error("unsupported array rank {0}: expected 2 or 3")]
    UnsupportedArrayRank(usize),

    /// Extent does not fit the 4-byte dimension field
    #[error("dimension {0} does not fit the header")]
    DimensionTooLarge(usize),

    /// Boxed values share no common kind
    #[error("object array mixes {first} with {found}")]
    MixedObjectKinds {
        /// Kind inferred so far
        first: ElementKind,
        /// Kind that could not be unified with it
        found: ElementKind,
    },

    /// Upstream failure carried in the header's error number
    #[error("remote error {error_number}: {message}")]
    Remote {
        /// Non-zero error number from the header
        error_number: i32,
        /// Message from the payload
        message: String,
    },
}

impl CodecError {
    /// Classify this error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::BufferTooShort { .. }
            | Self::UnsupportedVersion(_)
            | Self::InvalidDataStart(_)
            | Self::InvalidRank(_)
            | Self::UnknownElementKind(_)
            | Self::NegativeDimension(_)
            | Self::PayloadLengthMismatch { .. }
            | Self::PayloadTooLarge { .. }
            | Self::UnsupportedWireKind(_)
            | Self::IncompatibleKinds { .. }
            | Self::ValueOutOfRange { .. } => ErrorCategory::Format,
            Self::InvalidKind { .. } => ErrorCategory::InvalidKind,
            Self::UnsupportedArrayRank(_)
            | Self::DimensionTooLarge(_)
            | Self::MixedObjectKinds { .. } => ErrorCategory::InvalidArray,
            Self::Remote { .. } => ErrorCategory::Protocol,
        }
    }

    /// True if the buffer itself is malformed.
    pub const fn is_format_error(&self) -> bool {
        matches!(self.category(), ErrorCategory::Format)
    }
}
