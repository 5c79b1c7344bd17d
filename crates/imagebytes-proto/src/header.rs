//! Fixed-size metadata header.
//!
//! Eleven 4-byte little-endian fields, 44 bytes in total. The layout is
//! checked at compile time through `zerocopy`, so parsing is a bounds check
//! plus field validation with no copying.
//!
//! Decoders locate the payload through the `data_start` field rather than
//! [`ImageHeader::SIZE`]. A later metadata version may append fields; as
//! long as it keeps the first eleven in place, this decoder still reads it.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
    byteorder::{I32, LittleEndian, U32},
};

use crate::{
    errors::{CodecError, Result},
    kind::ElementKind,
};

/// Array rank carried in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum Rank {
    /// Monochrome frame: `[dim1, dim2]`
    Two = 2,
    /// Planar colour frame: `[dim1, dim2, dim3]`
    Three = 3,
}

impl Rank {
    /// Header value.
    pub const fn to_i32(self) -> i32 {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// Parse a header value.
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            _ => None,
        }
    }
}

/// Raw wire header.
///
/// Field accessors return the values as stored; validation happens in
/// [`decode_header`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct ImageHeader {
    version: I32<LittleEndian>,
    error_number: I32<LittleEndian>,
    client_transaction_id: U32<LittleEndian>,
    server_transaction_id: U32<LittleEndian>,
    data_start: I32<LittleEndian>,
    logical_kind: I32<LittleEndian>,
    wire_kind: I32<LittleEndian>,
    rank: I32<LittleEndian>,
    dim1: I32<LittleEndian>,
    dim2: I32<LittleEndian>,
    dim3: I32<LittleEndian>,
}

const _: () = assert!(size_of::<ImageHeader>() == ImageHeader::SIZE);

impl ImageHeader {
    /// Encoded header length for version 1.
    pub const SIZE: usize = 44;

    /// Metadata version written by this codec.
    pub const VERSION: i32 = 1;

    /// Borrow the header at the front of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(bytes)
            .map(|(header, _)| header)
            .map_err(|_| CodecError::BufferTooShort { needed: Self::SIZE, actual: bytes.len() })
    }

    /// Build the version 1 header for `meta`.
    ///
    /// `version` and `data_start` are always written as [`Self::VERSION`] and
    /// [`Self::SIZE`], whatever `meta` holds.
    pub fn new(meta: &ArrayMetadata) -> Self {
        Self {
            version: I32::new(Self::VERSION),
            error_number: I32::new(meta.error_number),
            client_transaction_id: U32::new(meta.client_transaction_id),
            server_transaction_id: U32::new(meta.server_transaction_id),
            data_start: I32::new(Self::SIZE as i32),
            logical_kind: I32::new(meta.logical_kind.to_code()),
            wire_kind: I32::new(meta.wire_kind.to_code()),
            rank: I32::new(meta.rank.to_i32()),
            dim1: I32::new(meta.dim1 as i32),
            dim2: I32::new(meta.dim2 as i32),
            dim3: I32::new(meta.dim3 as i32),
        }
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes.copy_from_slice(self.as_bytes());
        bytes
    }

    /// Metadata version
    pub fn version(&self) -> i32 {
        self.version.get()
    }

    /// Upstream error number (0 = success)
    pub fn error_number(&self) -> i32 {
        self.error_number.get()
    }

    /// Client transaction id
    pub fn client_transaction_id(&self) -> u32 {
        self.client_transaction_id.get()
    }

    /// Server transaction id
    pub fn server_transaction_id(&self) -> u32 {
        self.server_transaction_id.get()
    }

    /// Payload offset
    pub fn data_start(&self) -> i32 {
        self.data_start.get()
    }

    /// Logical element kind code
    pub fn logical_kind_code(&self) -> i32 {
        self.logical_kind.get()
    }

    /// Wire element kind code
    pub fn wire_kind_code(&self) -> i32 {
        self.wire_kind.get()
    }

    /// Rank field
    pub fn rank(&self) -> i32 {
        self.rank.get()
    }

    /// Dimension fields
    pub fn dims(&self) -> [i32; 3] {
        [self.dim1.get(), self.dim2.get(), self.dim3.get()]
    }
}

/// Decoded, validated header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayMetadata {
    /// Metadata version
    pub version: i32,
    /// Upstream error number (0 = success)
    pub error_number: i32,
    /// Client transaction id
    pub client_transaction_id: u32,
    /// Server transaction id
    pub server_transaction_id: u32,
    /// Byte offset of the payload
    pub data_start: u32,
    /// Kind the receiver gets back after decode
    pub logical_kind: ElementKind,
    /// Kind used to pack the payload
    pub wire_kind: ElementKind,
    /// Array rank
    pub rank: Rank,
    /// First extent
    pub dim1: u32,
    /// Second extent
    pub dim2: u32,
    /// Third extent (0 for rank 2)
    pub dim3: u32,
}

impl ArrayMetadata {
    /// Version 1 metadata with zeroed transaction and error fields.
    pub fn new(
        logical_kind: ElementKind,
        wire_kind: ElementKind,
        rank: Rank,
        dims: (u32, u32, u32),
    ) -> Self {
        let (dim1, dim2, dim3) = dims;
        Self {
            version: ImageHeader::VERSION,
            error_number: 0,
            client_transaction_id: 0,
            server_transaction_id: 0,
            data_start: ImageHeader::SIZE as u32,
            logical_kind,
            wire_kind,
            rank,
            dim1,
            dim2,
            dim3: if rank == Rank::Two { 0 } else { dim3 },
        }
    }

    /// Array extents in axis order.
    pub fn shape(&self) -> Vec<usize> {
        match self.rank {
            Rank::Two => vec![self.dim1 as usize, self.dim2 as usize],
            Rank::Three => vec![self.dim1 as usize, self.dim2 as usize, self.dim3 as usize],
        }
    }

    /// Number of elements the payload holds. `None` on overflow.
    pub fn element_count(&self) -> Option<usize> {
        self.shape().into_iter().try_fold(1usize, usize::checked_mul)
    }

    /// Payload length in bytes implied by the extents and wire kind. `None`
    /// on overflow.
    pub fn payload_len(&self) -> Option<usize> {
        self.element_count()?.checked_mul(self.wire_kind.byte_width())
    }
}

/// Encode the 44-byte version 1 header.
pub fn encode_header(meta: &ArrayMetadata) -> [u8; ImageHeader::SIZE] {
    ImageHeader::new(meta).to_bytes()
}

/// Decode and validate the header at the front of `buf`.
///
/// Fails with a format error if `buf` is shorter than the header or its
/// `data_start`, if the rank is not 2 or 3, if a kind code is unassigned, or
/// if a dimension is negative. Whether the wire kind widens to the logical
/// kind is not checked here.
pub fn decode_header(buf: &[u8]) -> Result<ArrayMetadata> {
    let header = ImageHeader::from_bytes(buf)?;

    let version = header.version();
    if version < ImageHeader::VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let data_start = header.data_start();
    let start = usize::try_from(data_start)
        .ok()
        .filter(|&start| start >= ImageHeader::SIZE)
        .ok_or(CodecError::InvalidDataStart(data_start))?;
    if buf.len() < start {
        return Err(CodecError::BufferTooShort { needed: start, actual: buf.len() });
    }

    let rank = Rank::from_i32(header.rank()).ok_or(CodecError::InvalidRank(header.rank()))?;
    let kind = |code: i32| ElementKind::from_code(code).ok_or(CodecError::UnknownElementKind(code));
    let logical_kind = kind(header.logical_kind_code())?;
    let wire_kind = kind(header.wire_kind_code())?;

    let extent = |d: i32| u32::try_from(d).map_err(|_| CodecError::NegativeDimension(d));
    let [d1, d2, d3] = header.dims();
    let dim3 = match rank {
        Rank::Two => 0,
        Rank::Three => extent(d3)?,
    };

    Ok(ArrayMetadata {
        version,
        error_number: header.error_number(),
        client_transaction_id: header.client_transaction_id(),
        server_transaction_id: header.server_transaction_id(),
        data_start: start as u32,
        logical_kind,
        wire_kind,
        rank,
        dim1: extent(d1)?,
        dim2: extent(d2)?,
        dim3,
    })
}
