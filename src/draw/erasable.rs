//! The erasable capability shared by every drawable type.
//!
//! Types opt in by implementing [`Erasable`], which fixes the serialized
//! record type and the erasable marker. Reconstruction comes in two flavours:
//! [`FromObject`] for types that can be rebuilt directly from their record,
//! and [`FromObjectAsync`] for types that must wait for an external resource
//! (bitmap images, externally stored eraser strokes). Asynchronous types
//! invoke their callback exactly once on success and never on failure.

use crate::scene::loader::ResourceLoader;
use thiserror::Error;

/// Construction-time geometry errors.
///
/// These are raised synchronously by constructors and `from_object`; a shape
/// that constructs successfully never fails later during rendering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("{kind} requires at least one point segment")]
    NoSegments { kind: &'static str },

    #[error("{kind} segment {index} has no points")]
    EmptySegment { kind: &'static str, index: usize },

    #[error("{kind} has invalid {field}: {value}")]
    InvalidDimension {
        kind: &'static str,
        field: &'static str,
        value: f64,
    },

    #[error("{kind} record has neither inline data nor a source to load from")]
    MissingSource { kind: &'static str },

    #[error("{kind} path data is empty")]
    EmptyPath { kind: &'static str },

    #[error("{kind} does not support property {property}")]
    UnsupportedProperty {
        kind: &'static str,
        property: &'static str,
    },
}

/// Callback receiving a reconstructed instance.
pub type Reconstructed<T> = Box<dyn FnOnce(T)>;

/// Marks a type as participating in erasure and serialization round trips.
pub trait Erasable {
    /// Every implementor is erasable; the constant exists so callers can test
    /// the capability without an instance.
    const IS_ERASABLE: bool = true;

    /// Whether reconstruction from a record has to wait for a resource.
    ///
    /// Types that set this must implement [`FromObjectAsync`]; the object
    /// dispatcher reads the constant from the type itself, so it holds for
    /// every construction path.
    const ASYNC_RECONSTRUCTION: bool = false;

    /// Discriminator written into serialized records.
    const TYPE_NAME: &'static str;

    /// Plain data record sufficient to rebuild an equivalent instance.
    type Data;

    fn to_object(&self) -> Self::Data;

    fn is_erasable(&self) -> bool {
        Self::IS_ERASABLE
    }
}

/// Synchronous reconstruction.
pub trait FromObject: Erasable + Sized {
    fn from_object(data: Self::Data) -> Result<Self, ShapeError>;
}

/// Callback-based reconstruction for types that may need to load resources.
///
/// Validation errors in `data` are returned immediately. Resource failures
/// are logged and the callback is dropped without being called.
pub trait FromObjectAsync: Erasable + Sized {
    fn from_object_async(
        data: Self::Data,
        loader: &mut dyn ResourceLoader,
        done: Reconstructed<Self>,
    ) -> Result<(), ShapeError>;
}

/// Rejects non-finite or negative scalar dimensions.
pub(crate) fn check_dimension(
    kind: &'static str,
    field: &'static str,
    value: f64,
) -> Result<f64, ShapeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ShapeError::InvalidDimension { kind, field, value })
    }
}
