//! Wire format for ImageBytes camera frame transfer.
//!
//! A buffer consists of a fixed 44-byte metadata header (zero-copy binary)
//! followed by a packed payload. The header records the transaction ids, an
//! upstream error number, the element kind the receiver should see (logical
//! kind) and the element kind actually packed on the wire (wire kind), plus
//! the rank and extents of the array.
//!
//! Camera frames are large (a 4000×3000 sensor is 12M elements) and usually
//! carry far fewer significant bits than their declared type. The encoder
//! scans the values once and packs them with the narrowest kind that still
//! widens losslessly back to the declared kind, so a 16-bit sensor read into
//! an `i32` buffer ships at half the size.
//!
//! # Layout
//!
//! ```text
//! ┌──────────────────────────── 44-byte header ─────────────────────────────┐┌── payload ──┐
//! │ version │ error │ client │ server │ start │ logical │ wire │ rank │ d1 d2 d3 ││ elements... │
//! └─────────────────────────────────────────────────────────────────────────┘└─────────────┘
//! ```
//!
//! Elements are row-major with the last dimension varying fastest, each
//! occupying the wire kind's width in little-endian order. When the error
//! number is non-zero the payload is a UTF-8 message instead.
//!
//! # Security
//!
//! Header parsing uses compile-time verified layouts via `zerocopy`. Decoders
//! enforce a configurable payload limit before allocating and reject payloads
//! whose length disagrees with the declared extents.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod array;
pub mod codec;
pub mod config;
pub mod element;
pub mod errors;
pub mod flatten;
pub mod header;
pub mod infer;
pub mod kind;
pub mod narrow;

pub use array::ImageArray;
pub use codec::{
    Decoder, Encoder, ImageFrame, decode, encode_as, encode_auto, encode_error, read_header,
    read_payload,
};
pub use config::{CodecConfig, NarrowingPolicy};
pub use element::{Element, Number, Scalar};
pub use errors::{CodecError, ErrorCategory, Result};
pub use header::{ArrayMetadata, ImageHeader, Rank, decode_header, encode_header};
pub use kind::{ElementKind, can_widen};
