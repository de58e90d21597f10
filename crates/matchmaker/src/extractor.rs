//! Extractors: derived, possibly absent values.
//!
//! An extractor computes a new value from the matched one and from the
//! captures bound so far. Reading captures lets a later step depend on what
//! an earlier sibling bound, e.g. comparing a join's build side with the
//! probe side captured a moment before.
//!
//! Returning `None` fails the match. Returning `Some(Value::null())` is a
//! present null, which only raw extractors can produce.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::capture::Captures;
use crate::value::{Object, Type, TypeTag, Value};

/// Type-erased extraction function.
pub type ExtractFn = Arc<dyn Fn(&Value, &Captures) -> Option<Value> + Send + Sync>;

/// Extracts an `R` from a `T`.
pub struct Extractor<T: ?Sized, R: ?Sized> {
    function: ExtractFn,
    /// Narrowest type every accepted input belongs to.
    scope: TypeTag,
    _type: PhantomData<fn(&T) -> Box<R>>,
}

impl<T: ?Sized, R: ?Sized> Extractor<T, R> {
    /// Extractor over raw values. Sees null inputs and may produce null.
    ///
    /// A raw extractor may accept any input, so it is scoped to the root type
    /// regardless of `T`.
    pub fn raw(function: impl Fn(&Value, &Captures) -> Option<Value> + Send + Sync + 'static) -> Self {
        Self::scoped(TypeTag::object(), function)
    }

    fn scoped(
        scope: TypeTag,
        function: impl Fn(&Value, &Captures) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        Extractor {
            function: Arc::new(function),
            scope,
            _type: PhantomData,
        }
    }

    pub(crate) fn function(&self) -> ExtractFn {
        Arc::clone(&self.function)
    }

    pub(crate) fn scope(&self) -> TypeTag {
        self.scope
    }
}

impl<T: Type + ?Sized, R: Object> Extractor<T, R> {
    /// Extractor that only runs on instances of `T`; anything else,
    /// null included, is absent.
    pub fn assuming_type(function: impl Fn(&T) -> Option<R> + Send + Sync + 'static) -> Self {
        Self::assuming_type_with(move |value: &T, _: &Captures| function(value))
    }

    /// Like [`assuming_type`](Self::assuming_type), with access to the
    /// captures bound so far.
    pub fn assuming_type_with(
        function: impl Fn(&T, &Captures) -> Option<R> + Send + Sync + 'static,
    ) -> Self {
        Self::scoped(T::tag(), move |value: &Value, captures: &Captures| {
            let narrowed = value.narrow::<T>()?;
            function(narrowed, captures).map(Value::new)
        })
    }
}

impl<T: ?Sized, R: ?Sized> Clone for Extractor<T, R> {
    fn clone(&self) -> Self {
        Extractor {
            function: self.function(),
            scope: self.scope,
            _type: PhantomData,
        }
    }
}
