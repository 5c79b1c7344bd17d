//! Encode and decode entry points.
//!
//! Both encode paths share one builder and differ only in how the wire kind
//! is chosen:
//!
//! - [`Encoder::encode_auto`] scans the values and packs with the narrowest
//!   kind that widens back to the declared kind
//! - [`Encoder::encode_as`] checks that the requested kind is a safe widening
//!   of the declared kind and packs with exactly that kind
//!
//! ```text
//!  ImageArray ──► infer (Object only) ──► narrow / validate ──► header + flatten ──► Bytes
//!  Bytes ──► decode_header ──► error_number != 0 ? Remote(message) : unflatten ──► ImageArray
//! ```

use bytes::{Bytes, BytesMut};
use ndarray::ArrayD;
use tracing::debug;

use crate::{
    array::ImageArray,
    config::{CodecConfig, NarrowingPolicy},
    element::Element,
    errors::{CodecError, Result},
    flatten::{flatten_into, unflatten},
    header::{ArrayMetadata, ImageHeader, Rank, decode_header, encode_header},
    infer::infer_kind,
    kind::{ElementKind, can_widen},
    narrow::narrow_with_policy,
};

/// Builder for one ImageBytes buffer.
#[derive(Debug, Clone)]
pub struct Encoder<'a> {
    array: &'a ImageArray,
    client_transaction_id: u32,
    server_transaction_id: u32,
    error_number: i32,
    error_message: &'a str,
    narrowing: NarrowingPolicy,
}

impl<'a> Encoder<'a> {
    /// Start a successful response carrying `array`.
    pub fn new(array: &'a ImageArray) -> Self {
        Self {
            array,
            client_transaction_id: 0,
            server_transaction_id: 0,
            error_number: 0,
            error_message: "",
            narrowing: NarrowingPolicy::default(),
        }
    }

    /// Apply settings from `config`.
    #[must_use]
    pub fn with_config(mut self, config: &CodecConfig) -> Self {
        self.narrowing = config.narrowing;
        self
    }

    /// Override the narrowing policy for [`Self::encode_auto`].
    #[must_use]
    pub fn narrowing(mut self, policy: NarrowingPolicy) -> Self {
        self.narrowing = policy;
        self
    }

    /// Set the client and server transaction ids.
    #[must_use]
    pub fn transaction(mut self, client: u32, server: u32) -> Self {
        self.client_transaction_id = client;
        self.server_transaction_id = server;
        self
    }

    /// Report an upstream failure. A non-zero `error_number` replaces the
    /// packed elements with `message`; the dimension fields still describe
    /// the array.
    #[must_use]
    pub fn error(mut self, error_number: i32, message: &'a str) -> Self {
        self.error_number = error_number;
        self.error_message = message;
        self
    }

    /// Encode with the narrowest lossless wire kind.
    pub fn encode_auto(&self) -> Result<Bytes> {
        let failed = self.error_number != 0;
        let (logical, wire) = match self.array {
            ImageArray::Object(values) => {
                let concrete = infer_kind(values)?;
                let wire = if failed {
                    concrete
                } else {
                    narrow_with_policy(concrete, values.iter().map(|s| s.to_number()), self.narrowing)
                };
                (ElementKind::Object, wire)
            },
            typed => {
                let declared = typed.kind();
                (declared, if failed { declared } else { narrow_typed(typed, self.narrowing) })
            },
        };
        self.build(logical, wire)
    }

    /// Encode with `target` as both logical and wire kind.
    ///
    /// Fails with [`CodecError::InvalidKind`] unless the array's kind widens
    /// to `target`, whatever the values are. `Object` always succeeds and
    /// packs with the array's own kind; `Unknown` always fails.
    pub fn encode_as(&self, target: ElementKind) -> Result<Bytes> {
        let source = match self.array {
            ImageArray::Object(values) => infer_kind(values)?,
            typed => typed.kind(),
        };
        if !can_widen(source, target) {
            return Err(CodecError::InvalidKind { from: source, to: target });
        }

        if target == ElementKind::Object {
            self.build(ElementKind::Object, source)
        } else {
            self.build(target, target)
        }
    }

    fn build(&self, logical: ElementKind, wire: ElementKind) -> Result<Bytes> {
        let dims = self.array.header_dims()?;
        let rank = if self.array.rank() == 2 { Rank::Two } else { Rank::Three };
        let meta = ArrayMetadata {
            error_number: self.error_number,
            client_transaction_id: self.client_transaction_id,
            server_transaction_id: self.server_transaction_id,
            ..ArrayMetadata::new(logical, wire, rank, dims)
        };

        let payload_len = if self.error_number == 0 {
            self.array.len() * wire.byte_width()
        } else {
            self.error_message.len()
        };
        let mut buf = BytesMut::with_capacity(ImageHeader::SIZE + payload_len);
        buf.extend_from_slice(&encode_header(&meta));

        if self.error_number == 0 {
            flatten_into(self.array, wire, &mut buf)?;
        } else {
            buf.extend_from_slice(self.error_message.as_bytes());
        }

        debug!(
            logical = %logical,
            wire = %wire,
            elements = self.array.len(),
            bytes = buf.len(),
            error_number = self.error_number,
            "encoded image array"
        );
        Ok(buf.freeze())
    }
}

fn narrow_typed(array: &ImageArray, policy: NarrowingPolicy) -> ElementKind {
    fn scan<T: Element>(array: &ArrayD<T>, policy: NarrowingPolicy) -> ElementKind {
        narrow_with_policy(T::KIND, array.iter().map(|&v| v.to_number()), policy)
    }

    match array {
        ImageArray::Byte(a) => scan(a, policy),
        ImageArray::Int16(a) => scan(a, policy),
        ImageArray::UInt16(a) => scan(a, policy),
        ImageArray::Int32(a) => scan(a, policy),
        ImageArray::UInt32(a) => scan(a, policy),
        ImageArray::Int64(a) => scan(a, policy),
        ImageArray::UInt64(a) => scan(a, policy),
        ImageArray::Single(a) => scan(a, policy),
        ImageArray::Double(a) => scan(a, policy),
        ImageArray::Object(_) => ElementKind::Object,
    }
}

/// A decoded array together with its header.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    /// Decoded header
    pub metadata: ArrayMetadata,
    /// Reconstructed array of the logical kind
    pub array: ImageArray,
}

/// Receiving side of the codec.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: CodecConfig,
}

impl Decoder {
    /// Create a decoder with `config`.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Decode and validate the header only.
    pub fn read_header(&self, bytes: &[u8]) -> Result<ArrayMetadata> {
        decode_header(bytes)
    }

    /// Payload region starting at the header's `data_start`.
    pub fn read_payload<'b>(&self, bytes: &'b [u8]) -> Result<&'b [u8]> {
        let metadata = decode_header(bytes)?;
        payload(bytes, &metadata)
    }

    /// Decode a full buffer into an array of its logical kind.
    ///
    /// A non-zero error number yields [`CodecError::Remote`] with the
    /// payload text; no array is reconstructed.
    pub fn decode(&self, bytes: &[u8]) -> Result<ImageArray> {
        self.decode_image(bytes).map(|frame| frame.array)
    }

    /// [`Self::decode`], keeping the header.
    pub fn decode_image(&self, bytes: &[u8]) -> Result<ImageFrame> {
        let metadata = decode_header(bytes)?;
        let payload = payload(bytes, &metadata)?;

        if metadata.error_number != 0 {
            let message = String::from_utf8_lossy(payload).into_owned();
            debug!(
                error_number = metadata.error_number,
                client_transaction_id = metadata.client_transaction_id,
                server_transaction_id = metadata.server_transaction_id,
                "decoded remote error"
            );
            return Err(CodecError::Remote { error_number: metadata.error_number, message });
        }

        let max = self.config.max_payload_len;
        let size = metadata.payload_len().unwrap_or(usize::MAX);
        if size > max {
            return Err(CodecError::PayloadTooLarge { size, max });
        }

        let array = unflatten(payload, metadata.wire_kind, metadata.logical_kind, &metadata.shape())?;
        debug!(
            logical = %metadata.logical_kind,
            wire = %metadata.wire_kind,
            elements = array.len(),
            client_transaction_id = metadata.client_transaction_id,
            server_transaction_id = metadata.server_transaction_id,
            "decoded image array"
        );
        Ok(ImageFrame { metadata, array })
    }
}

fn payload<'b>(bytes: &'b [u8], metadata: &ArrayMetadata) -> Result<&'b [u8]> {
    let start = metadata.data_start as usize;
    bytes.get(start..).ok_or(CodecError::BufferTooShort { needed: start, actual: bytes.len() })
}

/// Encode `array` with the narrowest lossless wire kind.
///
/// A non-zero `error_number` replaces the elements with `error_message`.
pub fn encode_auto(
    array: &ImageArray,
    client_transaction_id: u32,
    server_transaction_id: u32,
    error_number: i32,
    error_message: &str,
) -> Result<Bytes> {
    Encoder::new(array)
        .transaction(client_transaction_id, server_transaction_id)
        .error(error_number, error_message)
        .encode_auto()
}

/// Encode `array` as `target`. See [`Encoder::encode_as`].
pub fn encode_as(
    array: &ImageArray,
    target: ElementKind,
    client_transaction_id: u32,
    server_transaction_id: u32,
    error_number: i32,
    error_message: &str,
) -> Result<Bytes> {
    Encoder::new(array)
        .transaction(client_transaction_id, server_transaction_id)
        .error(error_number, error_message)
        .encode_as(target)
}

/// Encode an error response that carries no array.
///
/// The header describes an empty rank-2 array of `Unknown` kind.
pub fn encode_error(
    client_transaction_id: u32,
    server_transaction_id: u32,
    error_number: i32,
    message: &str,
) -> Bytes {
    let meta = ArrayMetadata {
        error_number,
        client_transaction_id,
        server_transaction_id,
        ..ArrayMetadata::new(ElementKind::Unknown, ElementKind::Unknown, Rank::Two, (0, 0, 0))
    };
    let mut buf = BytesMut::with_capacity(ImageHeader::SIZE + message.len());
    buf.extend_from_slice(&encode_header(&meta));
    buf.extend_from_slice(message.as_bytes());
    buf.freeze()
}

/// Decode the header of `bytes`.
pub fn read_header(bytes: &[u8]) -> Result<ArrayMetadata> {
    decode_header(bytes)
}

/// Payload region of `bytes`, starting at the header's `data_start`.
pub fn read_payload(bytes: &[u8]) -> Result<&[u8]> {
    Decoder::default().read_payload(bytes)
}

/// Decode `bytes` with the default configuration.
pub fn decode(bytes: &[u8]) -> Result<ImageArray> {
    Decoder::default().decode(bytes)
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, Array3};

    use super::*;
    use crate::element::Scalar;

    fn ramp(rows: usize, cols: usize, offset: i32) -> ImageArray {
        ImageArray::from(Array2::from_shape_fn((rows, cols), |(i, j)| offset + i as i32 + 10 * j as i32))
    }

    #[test]
    fn auto_encode_records_both_kinds() {
        let bytes = Encoder::new(&ramp(4, 3, 0)).transaction(7, 9).encode_auto();
        let meta = bytes.as_deref().map(read_header);
        let meta = meta.ok().and_then(Result::ok);
        assert_eq!(meta.map(|m| (m.logical_kind, m.wire_kind)), Some((ElementKind::Int32, ElementKind::Byte)));
        assert_eq!(meta.map(|m| (m.client_transaction_id, m.server_transaction_id)), Some((7, 9)));
    }

    #[test]
    fn disabled_narrowing_keeps_declared_kind() {
        let config = CodecConfig { narrowing: NarrowingPolicy::Disabled, ..CodecConfig::default() };
        let bytes = Encoder::new(&ramp(2, 2, 0)).with_config(&config).encode_auto();
        let meta = bytes.ok().and_then(|b| read_header(&b).ok());
        assert_eq!(meta.map(|m| m.wire_kind), Some(ElementKind::Int32));
    }

    #[test]
    fn encode_as_is_a_static_check() {
        // Values fit UInt16, but Int32 does not widen to it.
        let image = ramp(2, 2, 0);
        assert_eq!(
            Encoder::new(&image).encode_as(ElementKind::UInt16),
            Err(CodecError::InvalidKind { from: ElementKind::Int32, to: ElementKind::UInt16 })
        );
        assert!(matches!(
            Encoder::new(&image).encode_as(ElementKind::Unknown),
            Err(CodecError::InvalidKind { .. })
        ));

        let wide = Encoder::new(&image).encode_as(ElementKind::Int64);
        let meta = wide.ok().and_then(|b| read_header(&b).ok());
        assert_eq!(meta.map(|m| (m.logical_kind, m.wire_kind)), Some((ElementKind::Int64, ElementKind::Int64)));
    }

    #[test]
    fn encode_as_object_boxes_on_decode() {
        let image = ImageArray::from(Array2::from_elem((1, 2), 5u16));
        let bytes = Encoder::new(&image).encode_as(ElementKind::Object);
        let decoded = bytes.ok().and_then(|b| decode(&b).ok());
        let expected = Array2::from_elem((1, 2), Scalar::UInt16(5)).into_dyn();
        assert_eq!(decoded, Some(ImageArray::Object(expected)));
    }

    #[test]
    fn object_array_carries_object_logical_kind() {
        let image = ImageArray::from(Array2::from_shape_fn((2, 2), |(i, j)| Scalar::Int32((i * 2 + j) as i32)));
        let bytes = Encoder::new(&image).encode_auto();
        let meta = bytes.as_deref().ok().and_then(|b| read_header(b).ok());
        assert_eq!(meta.map(|m| (m.logical_kind, m.wire_kind)), Some((ElementKind::Object, ElementKind::Byte)));

        let decoded = bytes.ok().and_then(|b| decode(&b).ok());
        let expected = Array2::from_shape_fn((2, 2), |(i, j)| Scalar::Byte((i * 2 + j) as u8)).into_dyn();
        assert_eq!(decoded, Some(ImageArray::Object(expected)));
    }

    #[test]
    fn error_payload_replaces_elements() {
        let image = ImageArray::from(Array3::<u16>::zeros((4, 3, 3)));
        let bytes = Encoder::new(&image).error(0x401, "exposure aborted").encode_auto();
        let bytes = bytes.unwrap_or_default();

        assert_eq!(read_payload(&bytes), Ok(&b"exposure aborted"[..]));
        let meta = read_header(&bytes).ok();
        assert_eq!(meta.map(|m| m.shape()), Some(vec![4, 3, 3]));
        assert_eq!(
            decode(&bytes),
            Err(CodecError::Remote { error_number: 0x401, message: "exposure aborted".to_string() })
        );
    }

    #[test]
    fn error_only_response() {
        let bytes = encode_error(3, 4, 1031, "not connected");
        let meta = read_header(&bytes).ok();
        assert_eq!(meta.map(|m| (m.logical_kind, m.shape())), Some((ElementKind::Unknown, vec![0, 0])));
        assert!(matches!(decode(&bytes), Err(CodecError::Remote { error_number: 1031, .. })));
    }

    #[test]
    fn decoder_enforces_payload_limit() {
        let bytes = encode_auto(&ramp(8, 8, 300), 0, 0, 0, "").unwrap_or_default();
        let decoder = Decoder::new(CodecConfig { max_payload_len: 64, ..CodecConfig::default() });
        assert_eq!(decoder.decode(&bytes), Err(CodecError::PayloadTooLarge { size: 128, max: 64 }));
    }

    #[test]
    fn rank_one_array_is_rejected() {
        let image = ImageArray::from(ndarray::Array1::<u8>::zeros(4));
        assert_eq!(Encoder::new(&image).encode_auto(), Err(CodecError::UnsupportedArrayRank(1)));
    }
}
