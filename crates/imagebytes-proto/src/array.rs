//! Typed image arrays.

use ndarray::{ArrayD, Dimension};

use crate::{
    element::{Element, Number, Scalar},
    errors::{CodecError, Result},
    kind::ElementKind,
};

/// A rank-2 (monochrome) or rank-3 (planar colour) image of one element
/// kind.
///
/// Axis order follows the wire: `[dim1, dim2]` or `[dim1, dim2, dim3]`, with
/// the last axis varying fastest in the packed payload. Arrays of other ranks
/// can be constructed but are rejected by the encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageArray {
    /// Unsigned 8-bit elements
    Byte(ArrayD<u8>),
    /// Signed 16-bit elements
    Int16(ArrayD<i16>),
    /// Unsigned 16-bit elements
    UInt16(ArrayD<u16>),
    /// Signed 32-bit elements
    Int32(ArrayD<i32>),
    /// Unsigned 32-bit elements
    UInt32(ArrayD<u32>),
    /// Signed 64-bit elements
    Int64(ArrayD<i64>),
    /// Unsigned 64-bit elements
    UInt64(ArrayD<u64>),
    /// 32-bit float elements
    Single(ArrayD<f32>),
    /// 64-bit float elements
    Double(ArrayD<f64>),
    /// Boxed elements whose kind is decided at runtime
    Object(ArrayD<Scalar>),
}

macro_rules! each_array {
    ($self:expr, $array:ident => $body:expr) => {
        match $self {
            ImageArray::Byte($array) => $body,
            ImageArray::Int16($array) => $body,
            ImageArray::UInt16($array) => $body,
            ImageArray::Int32($array) => $body,
            ImageArray::UInt32($array) => $body,
            ImageArray::Int64($array) => $body,
            ImageArray::UInt64($array) => $body,
            ImageArray::Single($array) => $body,
            ImageArray::Double($array) => $body,
            ImageArray::Object($array) => $body,
        }
    };
}

impl ImageArray {
    /// Declared element kind. `Object` for boxed arrays.
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Byte(_) => ElementKind::Byte,
            Self::Int16(_) => ElementKind::Int16,
            Self::UInt16(_) => ElementKind::UInt16,
            Self::Int32(_) => ElementKind::Int32,
            Self::UInt32(_) => ElementKind::UInt32,
            Self::Int64(_) => ElementKind::Int64,
            Self::UInt64(_) => ElementKind::UInt64,
            Self::Single(_) => ElementKind::Single,
            Self::Double(_) => ElementKind::Double,
            Self::Object(_) => ElementKind::Object,
        }
    }

    /// Axis extents.
    pub fn shape(&self) -> &[usize] {
        each_array!(self, array => array.shape())
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape().len()
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        each_array!(self, array => array.len())
    }

    /// True if any extent is zero.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exact element values in row-major order.
    pub fn numbers(&self) -> Box<dyn Iterator<Item = Number> + '_> {
        each_array!(self, array => Box::new(array.iter().map(|&v| v.to_number())))
    }

    /// Unwrap into a concretely typed array. Returns `None` if the variant
    /// does not hold `T`.
    pub fn into_typed<T: Element>(self) -> Option<ArrayD<T>> {
        T::from_image(self)
    }

    /// Borrow as a concretely typed array.
    pub fn as_typed<T: Element>(&self) -> Option<&ArrayD<T>> {
        T::view_image(self)
    }

    /// Extents as the three header dimension fields. `dim3` is 0 for rank-2
    /// arrays.
    pub(crate) fn header_dims(&self) -> Result<(u32, u32, u32)> {
        let shape = self.shape();
        // Extents travel as signed 4-byte fields.
        let fits = |n: usize| {
            i32::try_from(n).map(|d| d as u32).map_err(|_| CodecError::DimensionTooLarge(n))
        };

        match *shape {
            [d1, d2] => Ok((fits(d1)?, fits(d2)?, 0)),
            [d1, d2, d3] => Ok((fits(d1)?, fits(d2)?, fits(d3)?)),
            _ => Err(CodecError::UnsupportedArrayRank(shape.len())),
        }
    }
}

impl<T: Element, D: Dimension> From<ndarray::Array<T, D>> for ImageArray {
    fn from(array: ndarray::Array<T, D>) -> Self {
        T::into_image(array.into_dyn())
    }
}

impl<D: Dimension> From<ndarray::Array<Scalar, D>> for ImageArray {
    fn from(array: ndarray::Array<Scalar, D>) -> Self {
        Self::Object(array.into_dyn())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, Array3, Ix1};

    use super::*;

    #[test]
    fn from_typed_array_picks_variant() {
        let image = ImageArray::from(Array2::<u16>::zeros((4, 3)));
        assert_eq!(image.kind(), ElementKind::UInt16);
        assert_eq!(image.shape(), &[4, 3]);
        assert_eq!(image.rank(), 2);
        assert_eq!(image.len(), 12);

        let image = ImageArray::from(Array3::<f64>::zeros((2, 2, 3)));
        assert_eq!(image.kind(), ElementKind::Double);
        assert!(image.as_typed::<f64>().is_some());
        assert!(image.as_typed::<f32>().is_none());
    }

    #[test]
    fn into_typed_returns_original() {
        let array = Array2::from_shape_fn((2, 3), |(i, j)| (i * 10 + j) as i32);
        let image = ImageArray::from(array.clone());
        assert_eq!(image.clone().into_typed::<i32>(), Some(array.into_dyn()));
        assert_eq!(image.into_typed::<u32>(), None);
    }

    #[test]
    fn header_dims_by_rank() {
        let image = ImageArray::from(Array2::<u8>::zeros((4, 3)));
        assert_eq!(image.header_dims().ok(), Some((4, 3, 0)));

        let image = ImageArray::from(Array3::<u8>::zeros((3, 4, 3)));
        assert_eq!(image.header_dims().ok(), Some((3, 4, 3)));

        let image = ImageArray::from(ndarray::Array::<u8, Ix1>::zeros(5));
        assert!(matches!(image.header_dims(), Err(CodecError::UnsupportedArrayRank(1))));
    }

    #[test]
    fn numbers_follow_logical_order() {
        let image = ImageArray::from(Array2::from_shape_fn((2, 2), |(i, j)| (i * 2 + j) as u16));
        let values: Vec<Number> = image.numbers().collect();
        assert_eq!(values, [0, 1, 2, 3].map(Number::Int));

        let boxed = ImageArray::from(Array2::from_elem((1, 1), Scalar::Single(0.5)));
        assert_eq!(boxed.numbers().collect::<Vec<_>>(), vec![Number::Float(0.5)]);
    }

    #[test]
    fn object_array_from_scalars() {
        let array = Array2::from_elem((2, 2), Scalar::Int16(7));
        let image = ImageArray::from(array);
        assert_eq!(image.kind(), ElementKind::Object);
        assert!(!image.is_empty());
    }
}
