//! Array flattening: typed arrays to packed little-endian payloads and back.
//!
//! Element order is row-major with the last axis fastest, which is ndarray's
//! logical iteration order. When the wire kind equals the array's kind and
//! the array is contiguous, the payload is a single memory copy.

use bytes::{Bytes, BytesMut};
use ndarray::{ArrayD, IxDyn};
use tracing::trace;
use zerocopy::IntoBytes;

use crate::{
    array::ImageArray,
    element::{Element, Number, Scalar},
    errors::{CodecError, Result},
    kind::{ElementKind, can_widen},
};

/// Pack every element of `array` as `wire`.
///
/// `wire` must be a numeric kind in the same family as the array's kind.
/// Values are converted by value, so a `Byte` 250 packed as `UInt16` is 250.
/// A value that does not fit `wire` fails with
/// [`CodecError::ValueOutOfRange`].
pub fn flatten(array: &ImageArray, wire: ElementKind) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(array.len() * wire.byte_width());
    flatten_into(array, wire, &mut dst)?;
    Ok(dst.freeze())
}

/// [`flatten`] appending to an existing buffer.
pub fn flatten_into(array: &ImageArray, wire: ElementKind, dst: &mut BytesMut) -> Result<()> {
    if !wire.is_numeric() {
        return Err(CodecError::UnsupportedWireKind(wire));
    }

    match array {
        ImageArray::Byte(a) => pack_typed(a, wire, dst),
        ImageArray::Int16(a) => pack_typed(a, wire, dst),
        ImageArray::UInt16(a) => pack_typed(a, wire, dst),
        ImageArray::Int32(a) => pack_typed(a, wire, dst),
        ImageArray::UInt32(a) => pack_typed(a, wire, dst),
        ImageArray::Int64(a) => pack_typed(a, wire, dst),
        ImageArray::UInt64(a) => pack_typed(a, wire, dst),
        ImageArray::Single(a) => pack_typed(a, wire, dst),
        ImageArray::Double(a) => pack_typed(a, wire, dst),
        ImageArray::Object(a) => pack_numbers(a.iter().map(|s| s.to_number()), wire, dst),
    }
}

fn pack_typed<T: Element>(
    array: &ArrayD<T>,
    wire: ElementKind,
    dst: &mut BytesMut,
) -> Result<()> {
    if wire == T::KIND {
        match array.as_slice() {
            Some(slice) if cfg!(target_endian = "little") => {
                trace!(kind = %wire, elements = slice.len(), "bulk copy");
                dst.extend_from_slice(slice.as_bytes());
            },
            _ => array.iter().for_each(|&v| v.put_le(dst)),
        }
        return Ok(());
    }

    if !can_widen(T::KIND, wire) && !can_widen(wire, T::KIND) {
        return Err(CodecError::InvalidKind { from: T::KIND, to: wire });
    }
    pack_numbers(array.iter().map(|&v| v.to_number()), wire, dst)
}

fn pack_numbers<I>(values: I, wire: ElementKind, dst: &mut BytesMut) -> Result<()>
where
    I: Iterator<Item = Number>,
{
    match wire {
        ElementKind::Byte => pack_as::<u8, _>(values, dst),
        ElementKind::Int16 => pack_as::<i16, _>(values, dst),
        ElementKind::UInt16 => pack_as::<u16, _>(values, dst),
        ElementKind::Int32 => pack_as::<i32, _>(values, dst),
        ElementKind::UInt32 => pack_as::<u32, _>(values, dst),
        ElementKind::Int64 => pack_as::<i64, _>(values, dst),
        ElementKind::UInt64 => pack_as::<u64, _>(values, dst),
        ElementKind::Single => pack_as::<f32, _>(values, dst),
        ElementKind::Double => pack_as::<f64, _>(values, dst),
        ElementKind::Unknown | ElementKind::Object => Err(CodecError::UnsupportedWireKind(wire)),
    }
}

fn pack_as<W, I>(values: I, dst: &mut BytesMut) -> Result<()>
where
    W: Element,
    I: Iterator<Item = Number>,
{
    for value in values {
        W::from_number(value).ok_or(CodecError::ValueOutOfRange { kind: W::KIND })?.put_le(dst);
    }
    Ok(())
}

/// Rebuild an array of `logical` kind from a payload packed as `wire`.
///
/// `bytes` must hold exactly the number of elements `shape` implies. Each
/// element is widened to `logical` by value. For `logical == Object` the
/// result holds boxed values of the wire kind.
pub fn unflatten(
    bytes: &[u8],
    wire: ElementKind,
    logical: ElementKind,
    shape: &[usize],
) -> Result<ImageArray> {
    if !wire.is_numeric() {
        return Err(CodecError::UnsupportedWireKind(wire));
    }
    if !can_widen(wire, logical) {
        return Err(CodecError::IncompatibleKinds { wire, logical });
    }

    let expected = shape
        .iter()
        .try_fold(wire.byte_width(), |acc, &d| acc.checked_mul(d))
        .ok_or(CodecError::PayloadLengthMismatch { expected: usize::MAX, actual: bytes.len() })?;
    if bytes.len() != expected {
        return Err(CodecError::PayloadLengthMismatch { expected, actual: bytes.len() });
    }

    let shape = IxDyn(shape);
    match logical {
        ElementKind::Byte => unpack::<u8>(bytes, wire, shape),
        ElementKind::Int16 => unpack::<i16>(bytes, wire, shape),
        ElementKind::UInt16 => unpack::<u16>(bytes, wire, shape),
        ElementKind::Int32 => unpack::<i32>(bytes, wire, shape),
        ElementKind::UInt32 => unpack::<u32>(bytes, wire, shape),
        ElementKind::Int64 => unpack::<i64>(bytes, wire, shape),
        ElementKind::UInt64 => unpack::<u64>(bytes, wire, shape),
        ElementKind::Single => unpack::<f32>(bytes, wire, shape),
        ElementKind::Double => unpack::<f64>(bytes, wire, shape),
        ElementKind::Object => {
            let values = read_boxed(bytes, wire)?;
            into_array(shape, values, bytes.len()).map(ImageArray::Object)
        },
        ElementKind::Unknown => Err(CodecError::IncompatibleKinds { wire, logical }),
    }
}

fn unpack<L: Element>(bytes: &[u8], wire: ElementKind, shape: IxDyn) -> Result<ImageArray> {
    let values = match wire {
        ElementKind::Byte => widen::<u8, L>(bytes),
        ElementKind::Int16 => widen::<i16, L>(bytes),
        ElementKind::UInt16 => widen::<u16, L>(bytes),
        ElementKind::Int32 => widen::<i32, L>(bytes),
        ElementKind::UInt32 => widen::<u32, L>(bytes),
        ElementKind::Int64 => widen::<i64, L>(bytes),
        ElementKind::UInt64 => widen::<u64, L>(bytes),
        ElementKind::Single => widen::<f32, L>(bytes),
        ElementKind::Double => widen::<f64, L>(bytes),
        ElementKind::Unknown | ElementKind::Object => {
            return Err(CodecError::UnsupportedWireKind(wire));
        },
    }?;
    into_array(shape, values, bytes.len()).map(L::into_image)
}

fn widen<W: Element, L: Element>(bytes: &[u8]) -> Result<Vec<L>> {
    if W::KIND == L::KIND {
        return Ok(copy_exact::<L>(bytes));
    }

    bytes
        .chunks_exact(W::KIND.byte_width())
        .map(|mut chunk| {
            L::from_number(W::get_le(&mut chunk).to_number())
                .ok_or(CodecError::ValueOutOfRange { kind: L::KIND })
        })
        .collect()
}

fn copy_exact<L: Element>(bytes: &[u8]) -> Vec<L> {
    let kind = L::KIND;
    let width = kind.byte_width();
    let mut values = vec![L::default(); bytes.len() / width];
    if cfg!(target_endian = "little") {
        trace!(kind = %kind, elements = values.len(), "bulk copy");
        values.as_mut_slice().as_mut_bytes().copy_from_slice(bytes);
    } else {
        for (slot, mut chunk) in values.iter_mut().zip(bytes.chunks_exact(width)) {
            *slot = L::get_le(&mut chunk);
        }
    }
    values
}

fn read_boxed(bytes: &[u8], wire: ElementKind) -> Result<Vec<Scalar>> {
    fn boxed<W: Element>(bytes: &[u8]) -> Vec<Scalar> {
        bytes
            .chunks_exact(W::KIND.byte_width())
            .map(|mut chunk| W::get_le(&mut chunk).into_scalar())
            .collect()
    }

    match wire {
        ElementKind::Byte => Ok(boxed::<u8>(bytes)),
        ElementKind::Int16 => Ok(boxed::<i16>(bytes)),
        ElementKind::UInt16 => Ok(boxed::<u16>(bytes)),
        ElementKind::Int32 => Ok(boxed::<i32>(bytes)),
        ElementKind::UInt32 => Ok(boxed::<u32>(bytes)),
        ElementKind::Int64 => Ok(boxed::<i64>(bytes)),
        ElementKind::UInt64 => Ok(boxed::<u64>(bytes)),
        ElementKind::Single => Ok(boxed::<f32>(bytes)),
        ElementKind::Double => Ok(boxed::<f64>(bytes)),
        ElementKind::Unknown | ElementKind::Object => Err(CodecError::UnsupportedWireKind(wire)),
    }
}

fn into_array<T>(shape: IxDyn, values: Vec<T>, actual: usize) -> Result<ArrayD<T>> {
    let expected = values.len();
    ArrayD::from_shape_vec(shape, values)
        .map_err(|_| CodecError::PayloadLengthMismatch { expected, actual })
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, Array3};

    use super::*;

    #[test]
    fn rank_three_last_axis_fastest() {
        let array = Array3::from_shape_fn((3, 4, 3), |(i, j, k)| (k + 10 * j + 100 * i) as i32);
        let bytes = flatten(&ImageArray::from(array), ElementKind::Int16).ok();
        let values: Option<Vec<i16>> = bytes.map(|b| {
            b.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]])).collect()
        });

        let mut expected = Vec::new();
        for i in 0..3i16 {
            for j in 0..4i16 {
                for k in 0..3i16 {
                    expected.push(k + 10 * j + 100 * i);
                }
            }
        }
        assert_eq!(values, Some(expected));
    }

    #[test]
    fn signed_values_are_twos_complement() {
        let array = Array2::from_shape_vec((1, 3), vec![-2i32, -1, 300]).ok();
        let bytes = array.map(|a| flatten(&ImageArray::from(a), ElementKind::Int16));
        assert_eq!(
            bytes.and_then(Result::ok).as_deref(),
            Some(&[254, 255, 255, 255, 44, 1][..])
        );
    }

    #[test]
    fn byte_widens_by_value() {
        let image = ImageArray::from(Array2::from_elem((1, 2), 250u8));
        assert_eq!(
            flatten(&image, ElementKind::UInt16).ok().as_deref(),
            Some(&[250, 0, 250, 0][..])
        );
    }

    #[test]
    fn same_kind_copies_bytes() {
        let image = ImageArray::from(Array2::from_shape_fn((2, 2), |(i, j)| (i * 2 + j) as u16));
        assert_eq!(
            flatten(&image, ElementKind::UInt16).ok().as_deref(),
            Some(&[0, 0, 1, 0, 2, 0, 3, 0][..])
        );
    }

    #[test]
    fn non_contiguous_layout_keeps_logical_order() {
        // Transposed storage: memory order differs from logical order.
        let array = Array2::from_shape_vec((2, 3), vec![1u8, 2, 3, 4, 5, 6]).ok();
        let transposed = array.map(|a| a.reversed_axes());
        let bytes = transposed.map(|t| flatten(&ImageArray::from(t), ElementKind::Byte));
        assert_eq!(bytes.and_then(Result::ok).as_deref(), Some(&[1, 4, 2, 5, 3, 6][..]));
    }

    #[test]
    fn out_of_range_value_is_rejected() {
        let image = ImageArray::from(Array2::from_elem((1, 1), 256i32));
        assert_eq!(
            flatten(&image, ElementKind::Byte),
            Err(CodecError::ValueOutOfRange { kind: ElementKind::Byte })
        );
    }

    #[test]
    fn cross_family_wire_is_rejected() {
        let image = ImageArray::from(Array2::from_elem((1, 1), 1i32));
        assert_eq!(
            flatten(&image, ElementKind::Double),
            Err(CodecError::InvalidKind { from: ElementKind::Int32, to: ElementKind::Double })
        );
        assert_eq!(
            flatten(&image, ElementKind::Object),
            Err(CodecError::UnsupportedWireKind(ElementKind::Object))
        );
    }

    #[test]
    fn unflatten_widens_to_logical() {
        let bytes = [254u8, 255, 21, 0];
        let image = unflatten(&bytes, ElementKind::Int16, ElementKind::Int32, &[1, 2]);
        let expected = Array2::from_shape_vec((1, 2), vec![-2i32, 21]).map(|a| a.into_dyn()).ok();
        assert_eq!(image.ok().and_then(ImageArray::into_typed::<i32>), expected);
    }

    #[test]
    fn unflatten_object_boxes_wire_kind() {
        let bytes = [7u8, 9];
        let image = unflatten(&bytes, ElementKind::Byte, ElementKind::Object, &[2, 1]).ok();
        let values: Option<Vec<Scalar>> = match image {
            Some(ImageArray::Object(a)) => Some(a.iter().copied().collect()),
            _ => None,
        };
        assert_eq!(values, Some(vec![Scalar::Byte(7), Scalar::Byte(9)]));
    }

    #[test]
    fn unflatten_checks_length() {
        let bytes = [0u8; 5];
        assert_eq!(
            unflatten(&bytes, ElementKind::UInt16, ElementKind::UInt16, &[1, 2]),
            Err(CodecError::PayloadLengthMismatch { expected: 4, actual: 5 })
        );
        assert_eq!(
            unflatten(&bytes[..3], ElementKind::UInt16, ElementKind::UInt16, &[1, 2]),
            Err(CodecError::PayloadLengthMismatch { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn unflatten_rejects_narrowing() {
        assert_eq!(
            unflatten(&[0, 0], ElementKind::Int16, ElementKind::UInt16, &[1, 1]),
            Err(CodecError::IncompatibleKinds {
                wire: ElementKind::Int16,
                logical: ElementKind::UInt16
            })
        );
        assert_eq!(
            unflatten(&[], ElementKind::Unknown, ElementKind::Int32, &[0, 0]),
            Err(CodecError::UnsupportedWireKind(ElementKind::Unknown))
        );
    }

    #[test]
    fn empty_shape_round_trips() {
        let image = unflatten(&[], ElementKind::Double, ElementKind::Double, &[0, 3, 2]).ok();
        assert_eq!(image.as_ref().map(ImageArray::shape), Some(&[0, 3, 2][..]));
    }
}
