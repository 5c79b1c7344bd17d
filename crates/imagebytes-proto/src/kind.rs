//! Element kinds and the safe-widening lattice.
//!
//! Wire codes are a network contract shared with every ImageBytes peer. They
//! are listed explicitly in [`ElementKind::to_code`] and must never be derived
//! from declaration order. New kinds are appended with the next free code.

use std::fmt;

use serde_repr::{Deserialize_repr, Serialize_repr};

/// Scalar element type of an image array.
///
/// `Unknown` marks an absent or unspecified kind (used by error-only
/// responses). `Object` is the boxed passthrough kind: the receiver gets boxed
/// [`Scalar`](crate::Scalar) values rather than a concretely typed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ElementKind {
    /// Unspecified kind
    Unknown = 0,
    /// Signed 16-bit integer
    Int16 = 1,
    /// Signed 32-bit integer
    Int32 = 2,
    /// 64-bit IEEE float
    Double = 3,
    /// 32-bit IEEE float
    Single = 4,
    /// Unsigned 64-bit integer
    UInt64 = 5,
    /// Unsigned 8-bit integer
    Byte = 6,
    /// Signed 64-bit integer
    Int64 = 7,
    /// Unsigned 16-bit integer
    UInt16 = 8,
    /// Unsigned 32-bit integer
    UInt32 = 9,
    /// Boxed values of any numeric kind
    Object = 10,
}

impl ElementKind {
    /// Every kind, in wire-code order.
    pub const ALL: [Self; 11] = [
        Self::Unknown,
        Self::Int16,
        Self::Int32,
        Self::Double,
        Self::Single,
        Self::UInt64,
        Self::Byte,
        Self::Int64,
        Self::UInt16,
        Self::UInt32,
        Self::Object,
    ];

    /// Concrete numeric kinds, narrowest first. Within one width the signed
    /// kind precedes the unsigned one.
    pub const NUMERIC: [Self; 9] = [
        Self::Byte,
        Self::Int16,
        Self::UInt16,
        Self::Int32,
        Self::UInt32,
        Self::Int64,
        Self::UInt64,
        Self::Single,
        Self::Double,
    ];

    /// Wire code written into the header.
    pub const fn to_code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Int16 => 1,
            Self::Int32 => 2,
            Self::Double => 3,
            Self::Single => 4,
            Self::UInt64 => 5,
            Self::Byte => 6,
            Self::Int64 => 7,
            Self::UInt16 => 8,
            Self::UInt32 => 9,
            Self::Object => 10,
        }
    }

    /// Look up a kind by wire code. Returns `None` for unassigned codes.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Int16),
            2 => Some(Self::Int32),
            3 => Some(Self::Double),
            4 => Some(Self::Single),
            5 => Some(Self::UInt64),
            6 => Some(Self::Byte),
            7 => Some(Self::Int64),
            8 => Some(Self::UInt16),
            9 => Some(Self::UInt32),
            10 => Some(Self::Object),
            _ => None,
        }
    }

    /// Packed size of one element in bytes.
    ///
    /// `Unknown` and `Object` have no wire representation of their own and
    /// report 0.
    pub const fn byte_width(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Single => 4,
            Self::Int64 | Self::UInt64 | Self::Double => 8,
            Self::Unknown | Self::Object => 0,
        }
    }

    /// True for `Single` and `Double`.
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Single | Self::Double)
    }

    /// True for the signed integer kinds. Meaningless for floats, which
    /// report `false`.
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// True for the seven integer kinds.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
        )
    }

    /// True for kinds with a fixed wire representation.
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Inclusive value range of an integer kind.
    pub const fn int_range(self) -> Option<(i128, i128)> {
        match self {
            Self::Byte => Some((0, u8::MAX as i128)),
            Self::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::UInt16 => Some((0, u16::MAX as i128)),
            Self::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::UInt32 => Some((0, u32::MAX as i128)),
            Self::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::UInt64 => Some((0, u64::MAX as i128)),
            Self::Single | Self::Double | Self::Unknown | Self::Object => None,
        }
    }

    /// Whether every value of `self` is exactly representable as `target`.
    ///
    /// See [`can_widen`].
    pub fn can_widen(self, target: Self) -> bool {
        match (self, target) {
            (_, Self::Unknown) => false,
            (_, Self::Object) => true,
            (a, b) if a == b => true,
            (
                Self::Byte,
                Self::Int16 | Self::UInt16 | Self::Int32 | Self::UInt32 | Self::Int64 | Self::UInt64,
            )
            | (Self::Int16, Self::Int32 | Self::Int64)
            | (Self::Int32, Self::Int64)
            | (Self::UInt16, Self::UInt32 | Self::UInt64 | Self::Int32 | Self::Int64)
            | (Self::UInt32, Self::UInt64 | Self::Int64)
            | (Self::Single, Self::Double) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "Unknown",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Double => "Double",
            Self::Single => "Single",
            Self::UInt64 => "UInt64",
            Self::Byte => "Byte",
            Self::Int64 => "Int64",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::Object => "Object",
        };
        f.write_str(name)
    }
}

/// Safe-widening relation: can every value of `source` be represented exactly
/// as `target`?
///
/// - every kind widens to itself, except that nothing widens to `Unknown`
/// - `Byte` widens to every integer kind
/// - signed kinds widen only to wider signed kinds
/// - other unsigned kinds widen to wider unsigned kinds and to strictly wider
///   signed kinds
/// - `Single` widens to `Double`
/// - integers and floats never mix
/// - everything widens to `Object`
pub fn can_widen(source: ElementKind, target: ElementKind) -> bool {
    source.can_widen(target)
}
