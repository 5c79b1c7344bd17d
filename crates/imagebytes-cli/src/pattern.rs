//! Synthetic test-pattern frames.
//!
//! A pattern is a linear ramp from 0 to `max` across the frame in row-major
//! order, so the maximum lands on the last element and the value range (and
//! therefore the narrowed wire kind) is known in advance.

use imagebytes_proto::{Element, ElementKind, ImageArray, Number, Scalar};
use ndarray::{ArrayD, IxDyn};

use crate::CliError;

/// Shape and value range of a synthetic frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    /// Declared element kind. `Object` boxes `Int32` values.
    pub kind: ElementKind,
    /// First extent (`dim1`)
    pub width: usize,
    /// Second extent (`dim2`)
    pub height: usize,
    /// Third extent (`dim3`). `None` yields a rank-2 frame.
    pub planes: Option<usize>,
    /// Value of the last element
    pub max: u64,
}

impl Pattern {
    /// Array extents in axis order.
    pub fn shape(&self) -> Vec<usize> {
        match self.planes {
            Some(planes) => vec![self.width, self.height, planes],
            None => vec![self.width, self.height],
        }
    }

    /// Build the frame.
    pub fn build(&self) -> Result<ImageArray, CliError> {
        match self.kind {
            ElementKind::Byte => self.ramp::<u8>().map(ImageArray::from),
            ElementKind::Int16 => self.ramp::<i16>().map(ImageArray::from),
            ElementKind::UInt16 => self.ramp::<u16>().map(ImageArray::from),
            ElementKind::Int32 => self.ramp::<i32>().map(ImageArray::from),
            ElementKind::UInt32 => self.ramp::<u32>().map(ImageArray::from),
            ElementKind::Int64 => self.ramp::<i64>().map(ImageArray::from),
            ElementKind::UInt64 => self.ramp::<u64>().map(ImageArray::from),
            ElementKind::Single => self.ramp::<f32>().map(ImageArray::from),
            ElementKind::Double => self.ramp::<f64>().map(ImageArray::from),
            ElementKind::Object => {
                self.ramp::<i32>().map(|array| ImageArray::Object(array.mapv(Scalar::Int32)))
            },
            ElementKind::Unknown => Err(CliError::UnsupportedKind(self.kind)),
        }
    }

    fn ramp<T: Element>(&self) -> Result<ArrayD<T>, CliError> {
        let out_of_range = || CliError::MaxOutOfRange { max: self.max, kind: T::KIND };
        T::from_number(ramp_value(T::KIND, u128::from(self.max))).ok_or_else(out_of_range)?;

        let shape = self.shape();
        let count: usize = shape.iter().product();
        let span = count.saturating_sub(1).max(1) as u128;

        let values = (0..count)
            .map(|index| {
                let value = index as u128 * u128::from(self.max) / span;
                T::from_number(ramp_value(T::KIND, value)).ok_or_else(out_of_range)
            })
            .collect::<Result<Vec<T>, _>>()?;

        Ok(ArrayD::from_shape_vec(IxDyn(&shape), values)?)
    }
}

fn ramp_value(kind: ElementKind, value: u128) -> Number {
    match kind {
        // Round through f32 so the value is exactly representable.
        ElementKind::Single => Number::Float(f64::from(value as f32)),
        ElementKind::Double => Number::Float(value as f64),
        _ => Number::Int(value as i128),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(kind: ElementKind, max: u64) -> Pattern {
        Pattern { kind, width: 4, height: 3, planes: None, max }
    }

    #[test]
    fn ramp_ends_at_max() {
        let image = pattern(ElementKind::UInt16, 1100).build();
        let array = image.ok().and_then(ImageArray::into_typed::<u16>);
        let array = array.unwrap_or_default();
        assert_eq!(array.shape(), &[4, 3]);
        let values: Vec<u16> = array.iter().copied().collect();
        assert_eq!(values.first(), Some(&0));
        assert_eq!(values.get(1), Some(&100));
        assert_eq!(values.last(), Some(&1100));
    }

    #[test]
    fn planes_add_third_axis() {
        let image = Pattern { planes: Some(3), ..pattern(ElementKind::Byte, 255) }.build();
        assert_eq!(image.ok().map(|i| i.shape().to_vec()), Some(vec![4, 3, 3]));
    }

    #[test]
    fn max_must_fit_kind() {
        let result = pattern(ElementKind::Byte, 256).build();
        assert!(matches!(result, Err(CliError::MaxOutOfRange { max: 256, kind: ElementKind::Byte })));

        let empty = Pattern { width: 0, ..pattern(ElementKind::Int16, 70000) }.build();
        assert!(matches!(empty, Err(CliError::MaxOutOfRange { .. })));
    }

    #[test]
    fn single_rounds_large_maxima() {
        let image = pattern(ElementKind::Single, u64::from(u32::MAX)).build();
        assert!(image.is_ok());
    }

    #[test]
    fn object_pattern_boxes_int32() {
        let image = pattern(ElementKind::Object, 11).build();
        assert_eq!(image.as_ref().map(ImageArray::kind).ok(), Some(ElementKind::Object));
        let boxed = image.ok().and_then(ImageArray::into_typed::<f64>);
        assert!(boxed.is_none());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let result = pattern(ElementKind::Unknown, 0).build();
        assert!(matches!(result, Err(CliError::UnsupportedKind(ElementKind::Unknown))));
    }
}
