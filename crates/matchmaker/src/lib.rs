//! Matchmaker: composable pattern matching over runtime-typed trees.
//!
//! Callers describe a shape ("a projection whose source is a filter over a
//! scan") as a [`Pattern`], apply it to a [`Value`], and read the parts they
//! asked for back out of the resulting [`Match`] through [`Capture`] handles.
//!
//! ```text
//! let filter = Capture::<FilterNode>::new();
//! let scan = Capture::<ScanNode>::new();
//! let pattern = type_of::<ProjectNode>().with(&source().matching(
//!     &type_of::<FilterNode>()
//!         .captured_as(&filter)
//!         .with(&source().matching(&type_of::<ScanNode>().captured_as(&scan))),
//! ));
//! let found = pattern.match_value(&plan);
//! let filter_node = found.capture(&filter)?;
//! ```
//!
//! # Architecture
//!
//! - **Value model** (`value.rs`): [`Object`], [`Type`], [`TypeTag`], [`Value`]
//! - **Bindings** (`capture.rs`): [`Capture`], [`Captures`]
//! - **Outcome** (`outcome.rs`): [`Match`]
//! - **Patterns** (`pattern.rs`): node chain and construction API
//! - **Evaluation** (`matcher.rs`): [`Matcher`], [`dispatch`]
//! - **Combinators** (`property.rs`, `extractor.rs`, `multi.rs`)
//!
//! # Debug Environment Variables
//!
//! - `RUST_LOG=matchmaker=debug`: log multi-matcher indexing.
//! - `RUST_LOG=matchmaker=trace`: log dispatch decisions; combine with
//!   [`TracingMatcher`] for a span per evaluated node.

use std::sync::Once;

mod capture;
mod errors;
mod extractor;
mod matcher;
mod multi;
mod outcome;
mod pattern;
mod property;
mod value;


pub use capture::{Capture, CaptureId, Captures};
pub use errors::{MatchError, MatchResult};
pub use extractor::{ExtractFn, Extractor};
pub use matcher::{dispatch, DefaultMatcher, Matcher, TracingMatcher};
pub use multi::MultiMatcher;
pub use outcome::Match;
pub use pattern::{
    any, equal_to, equal_to_value, extract, is_null, nullable, satisfies, type_of, MatchFn,
    Pattern, PatternKind, PatternNode, Predicate, TypeTest,
};
pub use property::{optional_property, property, Property, PropertyConstraint, PropertyMatcher};
pub use value::{IntoValue, Object, Type, TypeTag, TypeTags, Value};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber for engine diagnostics.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
