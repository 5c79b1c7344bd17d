//! Rust scalar types that can travel as image elements.
//!
//! [`Element`] binds each primitive to its [`ElementKind`] and to its
//! little-endian wire form. Conversions between kinds go through [`Number`],
//! which holds any integer or float exactly, so a `u8` packed as `u16` keeps
//! its value rather than its bit pattern.

use std::fmt;

use bytes::{Buf, BufMut};
use ndarray::ArrayD;
use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::{array::ImageArray, kind::ElementKind};

/// Kind-independent numeric value.
///
/// Every supported integer fits in `i128` and every supported float in
/// `f64`, so conversion into a `Number` is always exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integer value
    Int(i128),
    /// Floating-point value
    Float(f64),
}

/// A primitive scalar that can be stored in an [`ImageArray`].
pub trait Element:
    Copy + Default + Send + Sync + fmt::Debug + FromBytes + IntoBytes + Immutable + 'static
{
    /// Element kind of this type.
    const KIND: ElementKind;

    /// Append the little-endian encoding of `self`.
    fn put_le<B: BufMut>(self, dst: &mut B);

    /// Read one little-endian value. The caller guarantees `src` holds at
    /// least `KIND.byte_width()` bytes.
    fn get_le<B: Buf>(src: &mut B) -> Self;

    /// Exact numeric value.
    fn to_number(self) -> Number;

    /// Convert by value. Returns `None` when `value` is not exactly
    /// representable.
    fn from_number(value: Number) -> Option<Self>;

    /// Box into a [`Scalar`].
    fn into_scalar(self) -> Scalar;

    /// Wrap a typed array in the matching [`ImageArray`] variant.
    fn into_image(array: ArrayD<Self>) -> ImageArray;

    /// Unwrap the matching [`ImageArray`] variant.
    fn from_image(image: ImageArray) -> Option<ArrayD<Self>>;

    /// Borrow the matching [`ImageArray`] variant.
    fn view_image(image: &ImageArray) -> Option<&ArrayD<Self>>;
}

macro_rules! element_common {
    ($kind:ident) => {
        const KIND: ElementKind = ElementKind::$kind;

        #[inline]
        fn into_scalar(self) -> Scalar {
            Scalar::$kind(self)
        }

        fn into_image(array: ArrayD<Self>) -> ImageArray {
            ImageArray::$kind(array)
        }

        fn from_image(image: ImageArray) -> Option<ArrayD<Self>> {
            match image {
                ImageArray::$kind(array) => Some(array),
                _ => None,
            }
        }

        fn view_image(image: &ImageArray) -> Option<&ArrayD<Self>> {
            match image {
                ImageArray::$kind(array) => Some(array),
                _ => None,
            }
        }
    };
}

macro_rules! int_element {
    ($ty:ty, $kind:ident, $put:ident, $get:ident) => {
        impl Element for $ty {
            element_common!($kind);

            #[inline]
            fn put_le<B: BufMut>(self, dst: &mut B) {
                dst.$put(self);
            }

            #[inline]
            fn get_le<B: Buf>(src: &mut B) -> Self {
                src.$get()
            }

            #[inline]
            fn to_number(self) -> Number {
                Number::Int(i128::from(self))
            }

            #[inline]
            fn from_number(value: Number) -> Option<Self> {
                match value {
                    Number::Int(v) => Self::try_from(v).ok(),
                    Number::Float(_) => None,
                }
            }
        }

        impl From<$ty> for Scalar {
            fn from(value: $ty) -> Self {
                Scalar::$kind(value)
            }
        }
    };
}

int_element!(u8, Byte, put_u8, get_u8);
int_element!(i16, Int16, put_i16_le, get_i16_le);
int_element!(u16, UInt16, put_u16_le, get_u16_le);
int_element!(i32, Int32, put_i32_le, get_i32_le);
int_element!(u32, UInt32, put_u32_le, get_u32_le);
int_element!(i64, Int64, put_i64_le, get_i64_le);
int_element!(u64, UInt64, put_u64_le, get_u64_le);

impl Element for f32 {
    element_common!(Single);

    #[inline]
    fn put_le<B: BufMut>(self, dst: &mut B) {
        dst.put_f32_le(self);
    }

    #[inline]
    fn get_le<B: Buf>(src: &mut B) -> Self {
        src.get_f32_le()
    }

    #[inline]
    fn to_number(self) -> Number {
        Number::Float(f64::from(self))
    }

    #[inline]
    fn from_number(value: Number) -> Option<Self> {
        match value {
            Number::Float(v) if v.is_nan() => Some(Self::NAN),
            Number::Float(v) => {
                let narrowed = v as Self;
                (f64::from(narrowed).to_bits() == v.to_bits()).then_some(narrowed)
            },
            Number::Int(_) => None,
        }
    }
}

impl Element for f64 {
    element_common!(Double);

    #[inline]
    fn put_le<B: BufMut>(self, dst: &mut B) {
        dst.put_f64_le(self);
    }

    #[inline]
    fn get_le<B: Buf>(src: &mut B) -> Self {
        src.get_f64_le()
    }

    #[inline]
    fn to_number(self) -> Number {
        Number::Float(self)
    }

    #[inline]
    fn from_number(value: Number) -> Option<Self> {
        match value {
            Number::Float(v) => Some(v),
            Number::Int(_) => None,
        }
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Self::Single(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

/// A boxed number whose kind is only known at runtime.
///
/// Elements of `Object` arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// Unsigned 8-bit integer
    Byte(u8),
    /// Signed 16-bit integer
    Int16(i16),
    /// Unsigned 16-bit integer
    UInt16(u16),
    /// Signed 32-bit integer
    Int32(i32),
    /// Unsigned 32-bit integer
    UInt32(u32),
    /// Signed 64-bit integer
    Int64(i64),
    /// Unsigned 64-bit integer
    UInt64(u64),
    /// 32-bit float
    Single(f32),
    /// 64-bit float
    Double(f64),
}

impl Scalar {
    /// Runtime kind of the boxed value.
    pub const fn kind(self) -> ElementKind {
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
        }
    }

    /// Exact numeric value.
    pub fn to_number(self) -> Number {
        match self {
            Self::Byte(v) => v.to_number(),
            Self::Int16(v) => v.to_number(),
            Self::UInt16(v) => v.to_number(),
            Self::Int32(v) => v.to_number(),
            Self::UInt32(v) => v.to_number(),
            Self::Int64(v) => v.to_number(),
            Self::UInt64(v) => v.to_number(),
            Self::Single(v) => v.to_number(),
            Self::Double(v) => v.to_number(),
        }
    }

    /// Box `value` as `kind`. Returns `None` if `kind` is not numeric or the
    /// value does not fit.
    pub fn from_number(kind: ElementKind, value: Number) -> Option<Self> {
        match kind {
            ElementKind::Byte => u8::from_number(value).map(Self::Byte),
            ElementKind::Int16 => i16::from_number(value).map(Self::Int16),
            ElementKind::UInt16 => u16::from_number(value).map(Self::UInt16),
            ElementKind::Int32 => i32::from_number(value).map(Self::Int32),
            ElementKind::UInt32 => u32::from_number(value).map(Self::UInt32),
            ElementKind::Int64 => i64::from_number(value).map(Self::Int64),
            ElementKind::UInt64 => u64::from_number(value).map(Self::UInt64),
            ElementKind::Single => f32::from_number(value).map(Self::Single),
            ElementKind::Double => f64::from_number(value).map(Self::Double),
            ElementKind::Unknown | ElementKind::Object => None,
        }
    }
}
