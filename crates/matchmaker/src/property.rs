//! Properties: projections that nested patterns are matched against.
//!
//! A [`Property<F, T>`] projects an `F` to a possibly absent `T`. Pairing it
//! with a pattern yields a [`PropertyMatcher`], which a chain applies through
//! [`Pattern::with`](crate::Pattern::with):
//!
//! ```text
//! let source = property::<dyn SingleSourcePlanNode, dyn PlanNode, _>(|node| node.source());
//! let pattern = type_of::<ProjectNode>().with(&source.of_type::<FilterNode>());
//! ```
//!
//! An absent projection fails the enclosing match without evaluating the
//! nested pattern. A projection that yields null is treated as absent.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use crate::capture::{Capture, Captures};
use crate::extractor::Extractor;
use crate::matcher::Matcher;
use crate::outcome::Match;
use crate::pattern::{self, type_of, Pattern, PatternNode};
use crate::value::{IntoValue, Object, Type, Value};

type Projection = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Projection paired with the pattern its result must match.
#[derive(Clone)]
pub struct PropertyConstraint {
    projection: Projection,
    pattern: Arc<PatternNode>,
}

impl PropertyConstraint {
    /// The nested pattern.
    pub fn pattern(&self) -> &PatternNode {
        &self.pattern
    }

    /// Project `value` and match the nested pattern on the result.
    pub(crate) fn evaluate(&self, matcher: &dyn Matcher, value: &Value, captures: &Captures) -> Match {
        match (self.projection)(value) {
            Some(projected) => matcher.evaluate(&self.pattern, &projected, captures),
            None => {
                trace!(input = value.type_name(), "property absent");
                Match::empty()
            }
        }
    }
}

impl fmt::Debug for PropertyConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyConstraint")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// A projection from `F` to a possibly absent `T`.
pub struct Property<F: ?Sized, T: ?Sized> {
    projection: Projection,
    _type: PhantomData<fn(&F) -> Box<T>>,
}

fn present(value: Value) -> Option<Value> {
    (!value.is_null()).then_some(value)
}

/// A total projection. A null result counts as absent.
pub fn property<F: Type + ?Sized, T: ?Sized, V: IntoValue>(
    project: impl Fn(&F) -> V + Send + Sync + 'static,
) -> Property<F, T> {
    Property::from_projection(move |value: &Value| {
        value
            .narrow::<F>()
            .and_then(|source| present(project(source).into_value()))
    })
}

/// A partial projection.
pub fn optional_property<F: Type + ?Sized, T: ?Sized, V: IntoValue>(
    project: impl Fn(&F) -> Option<V> + Send + Sync + 'static,
) -> Property<F, T> {
    Property::from_projection(move |value: &Value| {
        value
            .narrow::<F>()
            .and_then(&project)
            .and_then(|result| present(result.into_value()))
    })
}

impl<F: ?Sized, T: ?Sized> Property<F, T> {
    fn from_projection(projection: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static) -> Self {
        Property {
            projection: Arc::new(projection),
            _type: PhantomData,
        }
    }

    /// Require the projected value to match `pattern`.
    pub fn matching<R: ?Sized>(&self, pattern: &Pattern<R>) -> PropertyMatcher<F, R> {
        PropertyMatcher {
            constraint: PropertyConstraint {
                projection: Arc::clone(&self.projection),
                pattern: pattern.node_arc(),
            },
            _type: PhantomData,
        }
    }
}

impl<T: Type + ?Sized> Property<T, T> {
    /// The value itself.
    pub fn identity() -> Self {
        Property::from_projection(|value: &Value| {
            value.narrow::<T>().is_some().then(|| value.clone())
        })
    }
}

impl<F: ?Sized, T: Type + ?Sized> Property<F, T> {
    /// Bind the projected value to `capture`.
    pub fn captured_as(&self, capture: &Capture<T>) -> PropertyMatcher<F, T> {
        self.matching(&type_of::<T>().captured_as(capture))
    }

    /// Require the projected value to be an instance of `C`.
    pub fn of_type<C: Type + ?Sized>(&self) -> PropertyMatcher<F, C> {
        self.matching(&type_of::<C>())
    }

    /// Require the projected value to satisfy `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> PropertyMatcher<F, T> {
        self.matching(&type_of::<T>().filter(predicate))
    }

    /// Continue with the value `extractor` derives from the projection.
    pub fn extract<R: ?Sized>(&self, extractor: &Extractor<T, R>) -> PropertyMatcher<F, R> {
        self.matching(&type_of::<T>().extract(extractor))
    }
}

impl<F: ?Sized, T: Object + PartialEq> Property<F, T> {
    /// Require the projected value to equal `expected`.
    pub fn equal_to(&self, expected: T) -> PropertyMatcher<F, T> {
        self.matching(&pattern::equal_to(expected))
    }
}

impl<F: ?Sized, T: ?Sized> Clone for Property<F, T> {
    fn clone(&self) -> Self {
        Property {
            projection: Arc::clone(&self.projection),
            _type: PhantomData,
        }
    }
}

/// A property together with the pattern its value must match.
pub struct PropertyMatcher<F: ?Sized, R: ?Sized> {
    constraint: PropertyConstraint,
    _type: PhantomData<fn(&F) -> Box<R>>,
}

impl<F: ?Sized, R: ?Sized> PropertyMatcher<F, R> {
    pub(crate) fn constraint(&self) -> &PropertyConstraint {
        &self.constraint
    }
}

impl<F: ?Sized, R: ?Sized> Clone for PropertyMatcher<F, R> {
    fn clone(&self) -> Self {
        PropertyMatcher {
            constraint: self.constraint.clone(),
            _type: PhantomData,
        }
    }
}

impl<F: ?Sized, R: ?Sized> fmt::Debug for PropertyMatcher<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.constraint, f)
    }
}
