//! Element kind inference for boxed (`Object`) arrays.

use crate::{
    element::Scalar,
    errors::{CodecError, Result},
    kind::{ElementKind, can_widen},
};

/// Kind assumed for an empty `Object` array.
pub const EMPTY_OBJECT_KIND: ElementKind = ElementKind::Int32;

/// Find the concrete kind that holds every boxed value.
///
/// Uniform arrays yield their common kind. Mixed arrays yield the narrowest
/// kind every observed kind widens to, so `Int16` mixed with `UInt16` becomes
/// `Int32`. Kinds with no common target (integers with floats, `Int64` with
/// `UInt64`) fail with [`CodecError::MixedObjectKinds`].
pub fn infer_kind<'a, I>(elements: I) -> Result<ElementKind>
where
    I: IntoIterator<Item = &'a Scalar>,
{
    let mut inferred: Option<ElementKind> = None;

    for scalar in elements {
        let found = scalar.kind();
        inferred = Some(match inferred {
            None => found,
            Some(current) if current == found => current,
            Some(current) => {
                unify(current, found).ok_or(CodecError::MixedObjectKinds { first: current, found })?
            },
        });
    }

    Ok(inferred.unwrap_or(EMPTY_OBJECT_KIND))
}

fn unify(a: ElementKind, b: ElementKind) -> Option<ElementKind> {
    ElementKind::NUMERIC.into_iter().find(|&kind| can_widen(a, kind) && can_widen(b, kind))
}
