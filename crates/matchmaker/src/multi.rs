//! Ordered alternation over many patterns.
//!
//! A [`MultiMatcher`] tries its candidates in declaration order and returns
//! the first present match. Candidates are indexed by scope type once, at
//! construction, so a value only visits the candidates whose scope is in its
//! type closure.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::capture::Captures;
use crate::matcher::{DefaultMatcher, Matcher};
use crate::outcome::Match;
use crate::pattern::{MatchFn, Pattern, PatternKind, PatternNode};
use crate::value::{TypeTag, Value};

type Positions = SmallVec<[usize; 4]>;

struct Cases {
    patterns: Vec<Arc<PatternNode>>,
    /// Scope tag -> candidate positions, ascending.
    by_scope: FxHashMap<TypeTag, Positions>,
    scope: TypeTag,
}

impl Cases {
    fn candidates_for(&self, value: &Value) -> Positions {
        let Some(object) = value.object() else {
            return (0..self.patterns.len()).collect();
        };
        let mut positions: Positions = object
            .type_closure()
            .iter()
            .filter_map(|tag| self.by_scope.get(tag))
            .flatten()
            .copied()
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    fn evaluate(&self, matcher: &dyn Matcher, value: &Value, captures: &Captures) -> Match {
        for position in self.candidates_for(value) {
            let outcome = matcher.evaluate(&self.patterns[position], value, captures);
            if outcome.is_present() {
                trace!(position, "candidate matched");
                return outcome;
            }
        }
        Match::empty()
    }
}

/// First-success alternation over patterns producing an `R`.
pub struct MultiMatcher<R: ?Sized> {
    cases: Arc<Cases>,
    _type: PhantomData<fn(&R)>,
}

impl<R: ?Sized> MultiMatcher<R> {
    /// Index `patterns` by scope type, keeping declaration order.
    pub fn new(patterns: Vec<Pattern<R>>) -> Self {
        let patterns: Vec<Arc<PatternNode>> = patterns.iter().map(Pattern::node_arc).collect();

        let mut by_scope: FxHashMap<TypeTag, Positions> = FxHashMap::default();
        for (position, node) in patterns.iter().enumerate() {
            by_scope.entry(node.scope_type()).or_default().push(position);
        }

        let mut scopes = by_scope.keys().copied();
        let scope = match (scopes.next(), scopes.next()) {
            (Some(only), None) => only,
            _ => TypeTag::object(),
        };

        debug!(
            candidates = patterns.len(),
            scopes = by_scope.len(),
            scope = scope.name(),
            "indexed multi-matcher"
        );

        MultiMatcher {
            cases: Arc::new(Cases {
                patterns,
                by_scope,
                scope,
            }),
            _type: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.cases.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.patterns.is_empty()
    }

    /// Scope shared by every candidate, or the root type.
    pub fn scope_type(&self) -> TypeTag {
        self.cases.scope
    }

    /// Positions of the candidates `value` would be tried against, in order.
    pub fn candidates_for(&self, value: &Value) -> Vec<usize> {
        self.cases.candidates_for(value).into_vec()
    }

    pub fn match_value(&self, value: &Value) -> Match<R> {
        self.match_with(value, &Captures::empty())
    }

    pub fn match_with(&self, value: &Value, captures: &Captures) -> Match<R> {
        self.cases.evaluate(&DefaultMatcher, value, captures).cast()
    }

    /// The alternation as a pattern, for use inside larger chains.
    pub fn into_pattern(self) -> Pattern<R> {
        let scope = self.cases.scope;
        let cases = self.cases;
        let function: MatchFn = Arc::new(
            move |matcher: &dyn Matcher, value: &Value, captures: &Captures| {
                cases.evaluate(matcher, value, captures)
            },
        );
        Pattern::from_node(PatternNode::root(scope, PatternKind::Function(function)))
    }
}

impl<R: ?Sized> Clone for MultiMatcher<R> {
    fn clone(&self) -> Self {
        MultiMatcher {
            cases: Arc::clone(&self.cases),
            _type: PhantomData,
        }
    }
}

impl<R: ?Sized> fmt::Debug for MultiMatcher<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiMatcher")
            .field("scope", &self.cases.scope)
            .field("patterns", &self.cases.patterns)
            .finish()
    }
}
