//! Match outcome.
//!
//! A [`Match`] is either *present*, holding a value (possibly null) and the
//! captures bound so far, or *empty*. An empty match never carries captures,
//! so a failed pattern cannot leak bindings. Failure to match is this empty
//! state, never a [`MatchError`].
//!
//! The type parameter only records what the value narrows to; the payload
//! is an untyped [`Value`]. The evaluator works with `Match<dyn Object>` and
//! typed patterns re-tag the result.

use std::fmt;
use std::marker::PhantomData;

use crate::capture::{Capture, Captures};
use crate::errors::{MatchError, MatchResult};
use crate::value::{Object, Type, Value};

struct Bound {
    value: Value,
    captures: Captures,
}

/// Outcome of applying a pattern.
#[must_use]
pub struct Match<T: ?Sized = dyn Object> {
    bound: Option<Bound>,
    _type: PhantomData<fn(&T)>,
}

impl<T: ?Sized> Match<T> {
    /// A present match.
    pub fn of(value: Value, captures: Captures) -> Self {
        Match {
            bound: Some(Bound { value, captures }),
            _type: PhantomData,
        }
    }

    /// The empty match.
    pub const fn empty() -> Self {
        Match {
            bound: None,
            _type: PhantomData,
        }
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        self.bound.is_some()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bound.is_none()
    }

    /// The matched value; `None` only for an empty match.
    pub fn raw_value(&self) -> Option<&Value> {
        self.bound.as_ref().map(|bound| &bound.value)
    }

    /// Captures of a present match.
    pub fn captures(&self) -> Option<&Captures> {
        self.bound.as_ref().map(|bound| &bound.captures)
    }

    /// Read a capture bound by this match.
    ///
    /// Fails with [`MatchError::EmptyMatchCapture`] on an empty match and with
    /// [`MatchError::UnknownCapture`] when the capture was never bound.
    pub fn capture<U: Type + ?Sized>(&self, capture: &Capture<U>) -> MatchResult<Option<&U>> {
        match &self.bound {
            Some(bound) => bound.captures.get(capture),
            None => Err(MatchError::EmptyMatchCapture {
                capture: capture.describe(),
            }),
        }
    }

    pub fn into_parts(self) -> Option<(Value, Captures)> {
        self.bound.map(|bound| (bound.value, bound.captures))
    }

    /// Re-tag the value type without touching the payload.
    pub(crate) fn cast<R: ?Sized>(self) -> Match<R> {
        Match {
            bound: self.bound,
            _type: PhantomData,
        }
    }

    /// Keep the match only if `predicate` holds on the raw value.
    pub(crate) fn filter_value(self, predicate: impl FnOnce(&Value) -> bool) -> Self {
        match self.bound {
            Some(bound) if predicate(&bound.value) => Match::of(bound.value, bound.captures),
            _ => Match::empty(),
        }
    }
}

impl<T: Type + ?Sized> Match<T> {
    /// The matched value viewed as `T`; `None` when empty or null.
    pub fn value(&self) -> Option<&T> {
        self.bound.as_ref().and_then(|bound| bound.value.narrow::<T>())
    }

    /// Keep the match only if `predicate` holds. A null value never
    /// satisfies a typed predicate.
    pub fn filter(self, predicate: impl FnOnce(&T) -> bool) -> Self {
        self.filter_value(|value| value.narrow::<T>().is_some_and(predicate))
    }

    /// Transform the value, keeping the captures. Null stays null.
    pub fn map<R: Object>(self, f: impl FnOnce(&T) -> R) -> Match<R> {
        let Some(Bound { value, captures }) = self.bound else {
            return Match::empty();
        };
        if value.is_null() {
            return Match::of(value, captures);
        }
        match value.narrow::<T>() {
            Some(narrowed) => Match::of(Value::new(f(narrowed)), captures),
            None => Match::empty(),
        }
    }

    /// Replace the match with the one `f` computes from the value and the
    /// captures. A null value yields an empty match.
    pub fn flat_map<R: ?Sized>(self, f: impl FnOnce(&T, &Captures) -> Match<R>) -> Match<R> {
        let Some(Bound { value, captures }) = self.bound else {
            return Match::empty();
        };
        match value.narrow::<T>() {
            Some(narrowed) => f(narrowed, &captures),
            None => Match::empty(),
        }
    }
}

impl<T: ?Sized> Clone for Match<T> {
    fn clone(&self) -> Self {
        Match {
            bound: self.bound.as_ref().map(|bound| Bound {
                value: bound.value.clone(),
                captures: bound.captures.clone(),
            }),
            _type: PhantomData,
        }
    }
}

impl<T: ?Sized> PartialEq for Match<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.bound, &other.bound) {
            (None, None) => true,
            (Some(a), Some(b)) => a.value == b.value && a.captures == b.captures,
            _ => false,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Match<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bound {
            Some(bound) => f
                .debug_struct("Match")
                .field("value", &bound.value)
                .field("captures", &bound.captures)
                .finish(),
            None => f.write_str("Match::Empty"),
        }
    }
}
