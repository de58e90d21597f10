//! Pattern node model and construction API.
//!
//! A pattern is a chain of immutable [`PatternNode`]s. Each node owns a link
//! to the node before it (`previous`); the handle a caller holds is the last
//! node of the chain. Matching starts at that node and evaluates backward:
//! a node first asks `previous` for a match and only then applies its own
//! test, threading the captures forward.
//!
//! # Node variants
//!
//! | Variant | Role |
//! |---------|------|
//! | `TypeOf` | root: the input is an instance of a type |
//! | `Equals` | root: the input equals a fixed value |
//! | `Filter` | the previous value satisfies a predicate |
//! | `Extract` | replace the previous value with an extracted one |
//! | `Capture` | bind the previous value to a capture |
//! | `Combine` | match a nested pattern against the previous value |
//! | `With` | constrain a property of the previous value |
//! | `Function` | node carrying its own match function |
//!
//! Semantics live in [`matcher::dispatch`](crate::matcher::dispatch), one
//! exhaustive `match` over [`PatternKind`].
//!
//! # Example
//!
//! ```text
//! let filter = Capture::<FilterNode>::new();
//! let pattern = type_of::<ProjectNode>()
//!     .with(&source().matching(&type_of::<FilterNode>().captured_as(&filter)));
//! let found = pattern.match_value(&plan);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::capture::{Capture, CaptureId, Captures};
use crate::errors::{MatchError, MatchResult};
use crate::extractor::{ExtractFn, Extractor};
use crate::matcher::{DefaultMatcher, Matcher};
use crate::outcome::Match;
use crate::property::{PropertyConstraint, PropertyMatcher};
use crate::value::{Object, Type, TypeTag, Value};

/// Predicate over a raw value.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Specialized match function of a [`PatternKind::Function`] node.
///
/// Receives the active matcher so nested evaluation stays on the same
/// strategy.
pub type MatchFn = Arc<dyn Fn(&dyn Matcher, &Value, &Captures) -> Match + Send + Sync>;

/// Runtime instance test of a `TypeOf` node.
#[derive(Clone, Copy)]
pub struct TypeTest {
    expected: TypeTag,
    test: fn(&Value) -> bool,
}

impl TypeTest {
    fn of<T: Type + ?Sized>() -> Self {
        TypeTest {
            expected: T::tag(),
            test: is_instance::<T>,
        }
    }

    pub fn expected(&self) -> TypeTag {
        self.expected
    }

    /// Whether `value` is a non-null instance of the expected type.
    #[inline]
    pub fn matches(&self, value: &Value) -> bool {
        (self.test)(value)
    }
}

fn is_instance<T: Type + ?Sized>(value: &Value) -> bool {
    value.narrow::<T>().is_some()
}

/// The closed set of node variants.
#[derive(Clone)]
pub enum PatternKind {
    TypeOf(TypeTest),
    Equals(Arc<dyn Object>),
    Filter(Predicate),
    Extract(ExtractFn),
    Capture(CaptureId),
    Combine(Arc<PatternNode>),
    With(PropertyConstraint),
    Function(MatchFn),
}

impl PatternKind {
    /// Variant name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::TypeOf(_) => "TypeOf",
            PatternKind::Equals(_) => "Equals",
            PatternKind::Filter(_) => "Filter",
            PatternKind::Extract(_) => "Extract",
            PatternKind::Capture(_) => "Capture",
            PatternKind::Combine(_) => "Combine",
            PatternKind::With(_) => "With",
            PatternKind::Function(_) => "Function",
        }
    }
}

/// One immutable node of a pattern chain.
pub struct PatternNode {
    /// Input domain of the chain this node ends. Used for indexing only.
    scope: TypeTag,
    previous: Option<Arc<PatternNode>>,
    kind: PatternKind,
}

impl PatternNode {
    pub(crate) fn root(scope: TypeTag, kind: PatternKind) -> Arc<Self> {
        Arc::new(PatternNode {
            scope,
            previous: None,
            kind,
        })
    }

    #[inline]
    pub fn scope_type(&self) -> TypeTag {
        self.scope
    }

    #[inline]
    pub fn previous(&self) -> Option<&PatternNode> {
        self.previous.as_deref()
    }

    #[inline]
    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    /// Nodes from the root to `self`.
    fn chain(&self) -> Vec<&PatternNode> {
        let mut nodes: Vec<&PatternNode> =
            std::iter::successors(Some(self), |node| node.previous()).collect();
        nodes.reverse();
        nodes
    }
}

impl Drop for PatternNode {
    // Unlink long chains iteratively instead of recursing once per node.
    fn drop(&mut self) {
        let mut previous = self.previous.take();
        while let Some(node) = previous {
            previous = match Arc::try_unwrap(node) {
                Ok(mut node) => node.previous.take(),
                Err(_) => None,
            };
        }
    }
}

impl fmt::Debug for PatternNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, node) in self.chain().into_iter().enumerate() {
            if position > 0 {
                f.write_str(" . ")?;
            }
            match &node.kind {
                PatternKind::TypeOf(test) => write!(f, "TypeOf({})", test.expected().name())?,
                PatternKind::Equals(expected) => write!(f, "Equals({expected:?})")?,
                PatternKind::Capture(id) => write!(f, "Capture({id:?})")?,
                PatternKind::Combine(next) => write!(f, "Combine({next:?})")?,
                PatternKind::With(constraint) => write!(f, "With({:?})", constraint.pattern())?,
                other => write!(f, "{}", other.name())?,
            }
        }
        Ok(())
    }
}

/// A pattern whose successful matches hold a `T`.
pub struct Pattern<T: ?Sized> {
    node: Arc<PatternNode>,
    _type: PhantomData<fn(&T)>,
}

impl<T: ?Sized> Pattern<T> {
    pub(crate) fn from_node(node: Arc<PatternNode>) -> Self {
        Pattern {
            node,
            _type: PhantomData,
        }
    }

    pub(crate) fn node_arc(&self) -> Arc<PatternNode> {
        Arc::clone(&self.node)
    }

    /// Last node of the chain.
    #[inline]
    pub fn node(&self) -> &PatternNode {
        &self.node
    }

    #[inline]
    pub fn scope_type(&self) -> TypeTag {
        self.node.scope
    }

    /// Append a node that inherits this chain's scope.
    fn push<R: ?Sized>(&self, kind: PatternKind) -> Pattern<R> {
        Pattern::from_node(Arc::new(PatternNode {
            scope: self.node.scope,
            previous: Some(self.node_arc()),
            kind,
        }))
    }

    /// Re-type the pattern. Matches keep their payload; `value()` narrows to
    /// `U` on access.
    ///
    /// The re-typing is not checked: `U` should be `T` itself, one of `T`'s
    /// supertypes or `dyn Object`. Any other `U` still compiles, but a match
    /// then reports `None` from `value()`, and a capture of it fails with
    /// [`MatchError::CaptureTypeMismatch`](crate::MatchError::CaptureTypeMismatch).
    pub fn upcast<U: Type + ?Sized>(&self) -> Pattern<U> {
        Pattern::from_node(self.node_arc())
    }

    /// Match `value` starting from empty captures.
    pub fn match_value(&self, value: &Value) -> Match<T> {
        self.match_with(value, &Captures::empty())
    }

    /// Match `value` on top of the captures bound so far.
    pub fn match_with(&self, value: &Value, captures: &Captures) -> Match<T> {
        self.match_using(&DefaultMatcher, value, captures)
    }

    /// Match with an explicit evaluation strategy.
    pub fn match_using(&self, matcher: &dyn Matcher, value: &Value, captures: &Captures) -> Match<T> {
        matcher.evaluate(&self.node, value, captures).cast()
    }
}

impl<T: Type + ?Sized> Pattern<T> {
    /// Bind the matched value to `capture`.
    pub fn captured_as(&self, capture: &Capture<T>) -> Pattern<T> {
        self.push(PatternKind::Capture(capture.id()))
    }

    /// Keep matches whose value satisfies `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Pattern<T> {
        self.push(PatternKind::Filter(Arc::new(move |value: &Value| {
            value.narrow::<T>().is_some_and(&predicate)
        })))
    }

    /// Continue with the value `extractor` derives from the match.
    pub fn extract<R: ?Sized>(&self, extractor: &Extractor<T, R>) -> Pattern<R> {
        self.push(PatternKind::Extract(extractor.function()))
    }

    /// Match `pattern` against this pattern's value; the result is
    /// `pattern`'s value.
    pub fn matching<R: ?Sized>(&self, pattern: &Pattern<R>) -> Pattern<R> {
        self.push(PatternKind::Combine(pattern.node_arc()))
    }

    /// Require a property of the matched value to match.
    ///
    /// The property's source type is checked at match time: if the value
    /// does not narrow to `F` the property is absent and the match fails.
    pub fn with<F: ?Sized, R: ?Sized>(&self, property: &PropertyMatcher<F, R>) -> Pattern<T> {
        self.push(PatternKind::With(property.constraint().clone()))
    }

    /// Replace each match with the one `f` computes from its value and
    /// captures.
    pub fn flat_map<R: ?Sized + 'static>(
        &self,
        f: impl Fn(&T, &Captures) -> Match<R> + Send + Sync + 'static,
    ) -> Pattern<R> {
        let source = self.node_arc();
        let function: MatchFn = Arc::new(
            move |matcher: &dyn Matcher, value: &Value, captures: &Captures| {
                matcher
                    .evaluate(&source, value, captures)
                    .cast::<T>()
                    .flat_map(&f)
                    .cast::<dyn Object>()
            },
        );
        Pattern::from_node(PatternNode::root(self.node.scope, PatternKind::Function(function)))
    }
}

impl<T: ?Sized> Clone for Pattern<T> {
    fn clone(&self) -> Self {
        Pattern::from_node(self.node_arc())
    }
}

impl<T: ?Sized> fmt::Debug for Pattern<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.node)
    }
}

/// Matches every non-null value.
pub fn any() -> Pattern<dyn Object> {
    type_of::<dyn Object>()
}

/// Matches non-null instances of `T`, subtypes included.
pub fn type_of<T: Type + ?Sized>() -> Pattern<T> {
    Pattern::from_node(PatternNode::root(
        T::tag(),
        PatternKind::TypeOf(TypeTest::of::<T>()),
    ))
}

/// Matches values equal to `expected`.
pub fn equal_to<T: Object + PartialEq>(expected: T) -> Pattern<T> {
    Pattern::from_node(PatternNode::root(
        TypeTag::of::<T>(),
        PatternKind::Equals(Arc::new(expected)),
    ))
}

/// Matches values equal to `expected`, which must not be null.
pub fn equal_to_value(expected: &Value) -> MatchResult<Pattern<dyn Object>> {
    let object = expected.shared().ok_or(MatchError::InvalidPattern {
        reason: "expected value can't be null, use `is_null()` instead",
    })?;
    Ok(Pattern::from_node(PatternNode::root(
        object.type_tag(),
        PatternKind::Equals(object),
    )))
}

/// Matches only null.
pub fn is_null<T: Type + ?Sized>() -> Pattern<T> {
    Pattern::from_node(PatternNode::root(
        TypeTag::object(),
        PatternKind::Filter(Arc::new(Value::is_null)),
    ))
}

/// Matches null or an instance of `T`.
pub fn nullable<T: Type + ?Sized>() -> Pattern<T> {
    let function: MatchFn = Arc::new(|_: &dyn Matcher, value: &Value, captures: &Captures| {
        if value.is_null() || is_instance::<T>(value) {
            Match::<dyn Object>::of(value.clone(), captures.clone())
        } else {
            Match::empty()
        }
    });
    Pattern::from_node(PatternNode::root(T::tag(), PatternKind::Function(function)))
}

/// Standalone predicate: a `Filter` with no previous node.
pub fn satisfies<T: Type + ?Sized>(
    predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
) -> Pattern<T> {
    Pattern::from_node(PatternNode::root(
        T::tag(),
        PatternKind::Filter(Arc::new(move |value: &Value| {
            value.narrow::<T>().is_some_and(&predicate)
        })),
    ))
}

/// Standalone extractor: an `Extract` with no previous node. It sees the
/// raw input, so a raw extractor can accept null.
///
/// The root is scoped by the extractor: `T`'s tag for typed extractors, the
/// root type for raw ones.
pub fn extract<T: ?Sized, R: ?Sized>(extractor: &Extractor<T, R>) -> Pattern<R> {
    Pattern::from_node(PatternNode::root(
        extractor.scope(),
        PatternKind::Extract(extractor.function()),
    ))
}
