//! Capture identities and the binding sets threaded through matching.
//!
//! A [`Capture<T>`] is an opaque slot a caller creates once and later uses to
//! read back the value a pattern bound to it. [`Captures`] is the immutable
//! binding set: a persistent list shared between a match and the matches it
//! was built from, so extending it never copies the existing bindings.
//!
//! # Merge semantics
//!
//! When the same capture is bound twice, the most recent binding wins. For
//! [`Captures::add_all`] this means the right-hand operand overrides the
//! receiver ("last merge wins").

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::errors::{MatchError, MatchResult};
use crate::value::{Type, Value};

static NEXT_CAPTURE_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a capture slot.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaptureId(u64);

impl CaptureId {
    fn fresh() -> Self {
        CaptureId(NEXT_CAPTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A typed capture slot.
///
/// Equality is identity: two captures are equal only if one is a clone of
/// the other.
pub struct Capture<T: ?Sized> {
    id: CaptureId,
    label: Option<Arc<str>>,
    _type: PhantomData<fn(&T)>,
}

impl<T: Type + ?Sized> Capture<T> {
    /// A fresh, unlabeled capture.
    pub fn new() -> Self {
        Capture {
            id: CaptureId::fresh(),
            label: None,
            _type: PhantomData,
        }
    }

    /// A fresh capture carrying a debug label.
    pub fn labeled(label: impl Into<Arc<str>>) -> Self {
        Capture {
            id: CaptureId::fresh(),
            label: Some(label.into()),
            _type: PhantomData,
        }
    }
}

impl<T: ?Sized> Capture<T> {
    #[inline]
    pub fn id(&self) -> CaptureId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Label if present, otherwise the numeric identity.
    pub fn describe(&self) -> String {
        match &self.label {
            Some(label) => format!("`{label}` ({:?})", self.id),
            None => format!("{:?}", self.id),
        }
    }
}

impl<T: Type + ?Sized> Default for Capture<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Capture<T> {
    fn clone(&self) -> Self {
        Capture {
            id: self.id,
            label: self.label.clone(),
            _type: PhantomData,
        }
    }
}

impl<T: ?Sized> PartialEq for Capture<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: ?Sized> Eq for Capture<T> {}

impl<T: ?Sized> Hash for Capture<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for Capture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "Capture({:?} {label:?})", self.id),
            None => write!(f, "Capture({:?})", self.id),
        }
    }
}

struct Binding {
    capture: CaptureId,
    value: Value,
    next: Option<Arc<Binding>>,
}

impl Drop for Binding {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(node) = next {
            next = match Arc::try_unwrap(node) {
                Ok(mut node) => node.next.take(),
                Err(_) => None,
            };
        }
    }
}

/// An immutable set of capture bindings, newest first.
#[derive(Clone, Default)]
pub struct Captures {
    head: Option<Arc<Binding>>,
}

impl Captures {
    /// The empty binding set.
    #[inline]
    pub const fn empty() -> Self {
        Captures { head: None }
    }

    /// A set holding a single binding.
    pub fn of<T: ?Sized>(capture: &Capture<T>, value: Value) -> Self {
        Self::empty().bind(capture.id(), value)
    }

    /// Extend with one binding, shadowing any previous binding of `capture`.
    #[must_use]
    pub fn bind(&self, capture: CaptureId, value: Value) -> Self {
        Captures {
            head: Some(Arc::new(Binding {
                capture,
                value,
                next: self.head.clone(),
            })),
        }
    }

    /// Union of `self` and `other`; `other`'s bindings win on collision.
    ///
    /// When `other` was built by extending `self` (the common case while a
    /// chain is being evaluated), only the bindings `other` added on top are
    /// copied.
    #[must_use]
    pub fn add_all(&self, other: &Captures) -> Self {
        if other.head.is_none() {
            return self.clone();
        }
        if self.head.is_none() {
            return other.clone();
        }

        let mut added: SmallVec<[&Binding; 8]> = SmallVec::new();
        let mut cursor = other.head.as_ref();
        while let Some(node) = cursor {
            if self.head.as_ref().is_some_and(|head| Arc::ptr_eq(head, node)) {
                break;
            }
            added.push(node);
            cursor = node.next.as_ref();
        }

        added
            .iter()
            .rev()
            .fold(self.clone(), |merged, node| {
                merged.bind(node.capture, node.value.clone())
            })
    }

    /// The value bound to `capture`, if any.
    pub fn get_value(&self, capture: CaptureId) -> Option<&Value> {
        self.bindings()
            .find(|(id, _)| *id == capture)
            .map(|(_, value)| value)
    }

    /// Typed lookup. `Ok(None)` means the capture is bound to null.
    pub fn get<T: Type + ?Sized>(&self, capture: &Capture<T>) -> MatchResult<Option<&T>> {
        let value = self
            .get_value(capture.id())
            .ok_or_else(|| MatchError::UnknownCapture {
                capture: capture.describe(),
            })?;
        if value.is_null() {
            return Ok(None);
        }
        value
            .narrow::<T>()
            .map(Some)
            .ok_or_else(|| MatchError::CaptureTypeMismatch {
                capture: capture.describe(),
                expected: T::tag().name(),
                found: value.type_name(),
            })
    }

    pub fn contains<T: ?Sized>(&self, capture: &Capture<T>) -> bool {
        self.get_value(capture.id()).is_some()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of distinct captures bound.
    pub fn len(&self) -> usize {
        self.bindings()
            .map(|(id, _)| id)
            .collect::<FxHashSet<_>>()
            .len()
    }

    /// All bindings newest first, shadowed ones included.
    pub fn bindings(&self) -> impl Iterator<Item = (CaptureId, &Value)> {
        std::iter::successors(self.head.as_deref(), |node| node.next.as_deref())
            .map(|node| (node.capture, &node.value))
    }

    /// Visible bindings keyed by capture.
    fn visible(&self) -> FxHashMap<CaptureId, &Value> {
        let mut visible = FxHashMap::default();
        for (id, value) in self.bindings() {
            visible.entry(id).or_insert(value);
        }
        visible
    }
}

impl PartialEq for Captures {
    fn eq(&self, other: &Self) -> bool {
        self.visible() == other.visible()
    }
}

impl fmt::Debug for Captures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut visible: Vec<_> = self.visible().into_iter().collect();
        visible.sort_by_key(|(id, _)| *id);
        f.debug_map().entries(visible).finish()
    }
}
