//! Pattern evaluation.
//!
//! [`dispatch`] interprets one node with a single exhaustive `match` over
//! [`PatternKind`]. Nested evaluation (a node's `previous`, a `Combine`
//! target, a property's pattern) goes back through the active [`Matcher`],
//! so a wrapping strategy such as [`TracingMatcher`] sees every node.
//!
//! Deep chains recurse through [`ensure_sufficient_stack`].

use tracing::trace;

use crate::capture::Captures;
use crate::outcome::Match;
use crate::pattern::{PatternKind, PatternNode};
use crate::value::Value;

/// Minimum stack space to keep available (100KB red zone).
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Grow the stack before running `f` if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Evaluation strategy for pattern nodes.
pub trait Matcher {
    /// Match `value` against the chain ending at `node`.
    fn evaluate(&self, node: &PatternNode, value: &Value, captures: &Captures) -> Match;
}

/// Plain evaluation through [`dispatch`].
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultMatcher;

impl Matcher for DefaultMatcher {
    #[inline]
    fn evaluate(&self, node: &PatternNode, value: &Value, captures: &Captures) -> Match {
        dispatch(self, node, value, captures)
    }
}

/// Evaluation that records a span per node and logs each outcome.
///
/// Produces the same matches as [`DefaultMatcher`].
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingMatcher;

impl Matcher for TracingMatcher {
    fn evaluate(&self, node: &PatternNode, value: &Value, captures: &Captures) -> Match {
        let span = tracing::trace_span!(
            "evaluate",
            kind = node.kind().name(),
            scope = node.scope_type().name(),
        );
        let _guard = span.enter();
        let outcome = dispatch(self, node, value, captures);
        trace!(
            input = value.type_name(),
            present = outcome.is_present(),
            "node evaluated"
        );
        outcome
    }
}

/// Match of `node`'s previous link, or the raw input when there is none.
fn evaluate_previous(
    matcher: &dyn Matcher,
    node: &PatternNode,
    value: &Value,
    captures: &Captures,
) -> Match {
    match node.previous() {
        Some(previous) => matcher.evaluate(previous, value, captures),
        None => Match::of(value.clone(), captures.clone()),
    }
}

/// Evaluate one node.
///
/// The previous link is resolved first; the node's own test only runs on
/// a present match and sees that match's value and captures.
pub fn dispatch(
    matcher: &dyn Matcher,
    node: &PatternNode,
    value: &Value,
    captures: &Captures,
) -> Match {
    ensure_sufficient_stack(|| {
        let Some((value, captures)) = evaluate_previous(matcher, node, value, captures).into_parts()
        else {
            return Match::empty();
        };

        match node.kind() {
            PatternKind::TypeOf(test) => {
                if test.matches(&value) {
                    Match::of(value, captures)
                } else {
                    Match::empty()
                }
            }
            PatternKind::Equals(expected) => {
                if value.object().is_some_and(|object| expected.equals(object)) {
                    Match::of(value, captures)
                } else {
                    Match::empty()
                }
            }
            PatternKind::Filter(predicate) => {
                if predicate(&value) {
                    Match::of(value, captures)
                } else {
                    Match::empty()
                }
            }
            PatternKind::Extract(extract) => match extract(&value, &captures) {
                Some(extracted) => Match::of(extracted, captures),
                None => {
                    trace!(input = value.type_name(), "extractor returned nothing");
                    Match::empty()
                }
            },
            PatternKind::Capture(id) => {
                let bound = captures.bind(*id, value.clone());
                Match::of(value, bound)
            }
            PatternKind::Combine(next) => {
                let Some((nested, nested_captures)) =
                    matcher.evaluate(next, &value, &captures).into_parts()
                else {
                    return Match::empty();
                };
                Match::of(nested, captures.add_all(&nested_captures))
            }
            PatternKind::With(constraint) => {
                let Some((_, property_captures)) =
                    constraint.evaluate(matcher, &value, &captures).into_parts()
                else {
                    return Match::empty();
                };
                let merged = captures.add_all(&property_captures);
                Match::of(value, merged)
            }
            PatternKind::Function(function) => function(matcher, &value, &captures),
        }
    })
}
