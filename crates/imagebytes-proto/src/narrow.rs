//! Value-range narrowing for the implicit encoder.
//!
//! One pass over the elements tracks the observed integer range; the wire
//! kind is then the first candidate that both holds that range and widens
//! back to the declared kind. Floats are never narrowed: a `Double` frame
//! stays `Double` and nothing crosses the integer/float boundary.

use crate::{
    config::NarrowingPolicy,
    element::Number,
    kind::{ElementKind, can_widen},
};

/// Inclusive range of integer values observed in an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    /// Smallest value
    pub min: i128,
    /// Largest value
    pub max: i128,
}

impl ValueRange {
    /// Scan integer values once.
    ///
    /// Returns `None` for an empty sequence or one holding a float.
    pub fn scan<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = Number>,
    {
        let mut range: Option<Self> = None;
        for value in values {
            let Number::Int(v) = value else {
                return None;
            };
            range = Some(match range {
                None => Self { min: v, max: v },
                Some(r) => Self { min: r.min.min(v), max: r.max.max(v) },
            });
        }
        range
    }

    /// Whether every value in the range is representable as `kind`.
    pub fn fits(&self, kind: ElementKind) -> bool {
        kind.int_range().is_some_and(|(lo, hi)| lo <= self.min && self.max <= hi)
    }
}

/// Narrowest kind that exactly represents every value, using the default
/// [`NarrowingPolicy::Narrowest`].
///
/// The result always widens to `declared`. An empty sequence returns
/// `declared` unchanged.
pub fn narrow<I>(declared: ElementKind, values: I) -> ElementKind
where
    I: IntoIterator<Item = Number>,
{
    narrow_with_policy(declared, values, NarrowingPolicy::Narrowest)
}

/// [`narrow`] under an explicit policy.
pub fn narrow_with_policy<I>(declared: ElementKind, values: I, policy: NarrowingPolicy) -> ElementKind
where
    I: IntoIterator<Item = Number>,
{
    if policy == NarrowingPolicy::Disabled || !declared.is_integer() {
        return declared;
    }

    match ValueRange::scan(values) {
        Some(range) => narrowest_for_range(declared, range, policy),
        None => declared,
    }
}

/// Choose the wire kind for an already scanned range.
pub fn narrowest_for_range(
    declared: ElementKind,
    range: ValueRange,
    policy: NarrowingPolicy,
) -> ElementKind {
    if policy == NarrowingPolicy::Disabled {
        return declared;
    }

    candidates(declared)
        .into_iter()
        .find(|&kind| {
            allowed(kind, declared, policy) && can_widen(kind, declared) && range.fits(kind)
        })
        .unwrap_or(declared)
}

/// Integer kinds narrowest first, preferring `declared`'s signedness within
/// each width.
fn candidates(declared: ElementKind) -> [ElementKind; 7] {
    use ElementKind::{Byte, Int16, Int32, Int64, UInt16, UInt32, UInt64};

    if declared.is_signed() {
        [Byte, Int16, UInt16, Int32, UInt32, Int64, UInt64]
    } else {
        [Byte, UInt16, Int16, UInt32, Int32, UInt64, Int64]
    }
}

fn allowed(kind: ElementKind, declared: ElementKind, policy: NarrowingPolicy) -> bool {
    match policy {
        NarrowingPolicy::Narrowest => true,
        NarrowingPolicy::PreserveSignedness => {
            kind == ElementKind::Byte || kind.is_signed() == declared.is_signed()
        },
        NarrowingPolicy::Disabled => kind == declared,
    }
}
