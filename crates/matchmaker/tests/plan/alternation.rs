use matchmaker::{
    is_null, property, type_of, Capture, Match, MultiMatcher, Object, Pattern, Property, Value,
};
use pretty_assertions::assert_eq;

use crate::fixtures::{
    filter, join, project, scan, FilterNode, JoinNode, PlanNode, ProjectNode, ScanNode,
    SingleSourcePlanNode,
};

fn source() -> Property<dyn SingleSourcePlanNode, dyn PlanNode> {
    property::<dyn SingleSourcePlanNode, dyn PlanNode, _>(|node| node.source())
}

fn rule_patterns() -> Vec<Pattern<dyn PlanNode>> {
    vec![
        // 0: project directly over a scan
        type_of::<ProjectNode>()
            .with(&source().of_type::<ScanNode>())
            .upcast::<dyn PlanNode>(),
        // 1: any single-source node over a filter
        type_of::<dyn SingleSourcePlanNode>()
            .with(&source().of_type::<FilterNode>())
            .upcast::<dyn PlanNode>(),
        // 2: any project
        type_of::<ProjectNode>().upcast::<dyn PlanNode>(),
        // 3: joins
        type_of::<JoinNode>().upcast::<dyn PlanNode>(),
        // 4: fallback
        type_of::<dyn PlanNode>(),
    ]
}

fn rules() -> MultiMatcher<dyn PlanNode> {
    MultiMatcher::new(rule_patterns())
}

/// The same rules, each replacing its match with its own position.
fn numbered_rules() -> MultiMatcher<usize> {
    let numbered: Vec<Pattern<usize>> = rule_patterns()
        .into_iter()
        .enumerate()
        .map(|(position, pattern)| {
            pattern.flat_map(move |_, captures| Match::of(Value::new(position), captures.clone()))
        })
        .collect();
    MultiMatcher::new(numbered)
}

#[test]
fn candidates_keep_declaration_order_across_scopes() {
    let rules = rules();
    assert_eq!(rules.candidates_for(&project(scan("t"))), vec![0, 1, 2, 4]);
    assert_eq!(rules.candidates_for(&filter(scan("t"))), vec![1, 4]);
    assert_eq!(rules.candidates_for(&join(scan("a"), scan("b"))), vec![3, 4]);
    assert_eq!(rules.candidates_for(&Value::new(1_i32)), Vec::<usize>::new());
}

#[test]
fn first_matching_rule_wins() {
    let rules = numbered_rules();
    let which = |value: &Value| rules.match_value(value).value().copied();

    assert_eq!(which(&project(scan("t"))), Some(0));
    assert_eq!(which(&project(filter(scan("t")))), Some(1));
    assert_eq!(which(&filter(filter(scan("t")))), Some(1));
    assert_eq!(which(&project(project(scan("t")))), Some(2));
    assert_eq!(which(&join(scan("a"), scan("b"))), Some(3));
    assert_eq!(which(&scan("t")), Some(4));
    assert_eq!(which(&Value::new("not a plan")), None);
}

#[test]
fn null_input_tries_every_candidate_in_order() {
    let rules = MultiMatcher::new(vec![
        type_of::<ScanNode>().upcast::<dyn Object>(),
        is_null::<dyn Object>(),
        type_of::<dyn Object>(),
    ]);
    assert_eq!(rules.candidates_for(&Value::null()), vec![0, 1, 2]);
    let found = rules.match_value(&Value::null());
    assert_eq!(found.raw_value(), Some(&Value::null()));
}

#[test]
fn multi_matcher_nests_inside_patterns() {
    let inner = Capture::<dyn PlanNode>::labeled("inner");
    let pattern = type_of::<ProjectNode>()
        .with(&source().matching(&rules().into_pattern().captured_as(&inner)));

    let found = pattern.match_value(&project(join(scan("a"), scan("b"))));
    let sources = found.capture(&inner).unwrap().map(|node| node.sources().len());
    assert_eq!(sources, Some(2));

    assert!(pattern.match_value(&project(Value::null())).is_empty());
}
