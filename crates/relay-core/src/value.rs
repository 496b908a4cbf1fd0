//! Tagged, type-erased values.

use std::any::Any;
use std::fmt;

use crate::error::RelayError;
use crate::key::TypeKey;

/// A boxed value carrying the [`TypeKey`] of its concrete type.
///
/// This is what middleware hands to the erased context setters and what
/// dynamic callers pass to [`Relay::handle_any`](crate::Relay::handle_any).
/// Type checks against a context slot compare tags; the value is never
/// coerced.
pub struct AnyValue {
    key: TypeKey,
    inner: Box<dyn Any + Send>,
}

impl AnyValue {
    /// Erases `value`, remembering its type.
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            inner: Box::new(value),
        }
    }

    /// Returns the key of the contained value's type.
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Returns `true` if the contained value is a `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.key.is::<T>()
    }

    /// Borrows the contained value as `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    /// Mutably borrows the contained value as `T`.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut()
    }

    /// Unwraps the contained value as `T`, handing the value back on mismatch.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        if !self.is::<T>() {
            return Err(self);
        }
        let key = self.key;
        match self.inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Self { key, inner }),
        }
    }

    /// Unwraps the contained value as `T`, or reports [`RelayError::InvalidType`].
    pub fn try_into_inner<T: 'static>(self) -> Result<T, RelayError> {
        let found = self.key.name();
        self.downcast::<T>().map_err(|_| RelayError::InvalidType {
            expected: std::any::type_name::<T>(),
            found,
        })
    }

    /// Borrows the contained value as `dyn Any`.
    pub fn as_any(&self) -> &(dyn Any + Send) {
        &*self.inner
    }

    /// Mutably borrows the contained value as `dyn Any`.
    pub fn as_any_mut(&mut self) -> &mut (dyn Any + Send) {
        &mut *self.inner
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyValue")
            .field("type", &self.key.name())
            .finish_non_exhaustive()
    }
}
