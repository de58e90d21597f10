use matchmaker::{
    any, init_tracing, property, type_of, Capture, Captures, Extractor, MatchError, Property,
    TracingMatcher, Value,
};
use pretty_assertions::assert_eq;

use crate::fixtures::{
    filter, join, project, scan, FilterNode, JoinNode, Nodes, PlanNode, ProjectNode, ScanNode,
    SingleSourcePlanNode,
};

fn source() -> Property<dyn SingleSourcePlanNode, dyn PlanNode> {
    property::<dyn SingleSourcePlanNode, dyn PlanNode, _>(|node| node.source())
}

fn probe() -> Property<JoinNode, dyn PlanNode> {
    property(|node: &JoinNode| node.probe.clone())
}

fn build() -> Property<JoinNode, dyn PlanNode> {
    property(|node: &JoinNode| node.build.clone())
}

#[test]
fn capturing_matches_in_a_typesafe_manner() {
    let filter_capture = Capture::<FilterNode>::labeled("filter");
    let scan_capture = Capture::<ScanNode>::labeled("scan");

    let pattern = type_of::<ProjectNode>().with(
        &source().matching(
            &type_of::<FilterNode>()
                .captured_as(&filter_capture)
                .with(&source().matching(&type_of::<ScanNode>().captured_as(&scan_capture))),
        ),
    );

    let tree = project(filter(scan("orders")));
    let found = pattern.match_value(&tree);

    let captured_filter = found.capture(&filter_capture).unwrap().unwrap();
    assert_eq!(captured_filter.source, scan("orders"));
    let captured_scan = found.capture(&scan_capture).unwrap().unwrap();
    assert_eq!(captured_scan.table, "orders");
}

#[test]
fn extractors_parameterized_with_captures() {
    let root = Capture::<JoinNode>::labeled("root");
    let parent = Capture::<JoinNode>::labeled("parent");
    let left = Capture::<ScanNode>::labeled("left");
    let right = Capture::<ScanNode>::labeled("right");
    let collected = Capture::<Nodes>::labeled("collected");

    let desired_captures = {
        let (root, parent, left, right) = (root.clone(), parent.clone(), left.clone(), right.clone());
        Extractor::<dyn PlanNode, Nodes>::assuming_type_with(move |_, captures| {
            let ids = [left.id(), right.id(), root.id(), parent.id()];
            ids.iter()
                .map(|id| captures.get_value(*id).cloned())
                .collect::<Option<Vec<Value>>>()
                .map(Nodes)
        })
    };

    let pattern = type_of::<JoinNode>()
        .captured_as(&root)
        .with(
            &probe().matching(
                &type_of::<JoinNode>()
                    .captured_as(&parent)
                    .with(&probe().matching(&type_of::<ScanNode>().captured_as(&left)))
                    .with(&build().matching(&type_of::<ScanNode>().captured_as(&right))),
            ),
        )
        .with(&build().matching(
            &type_of::<ScanNode>().matching(
                &type_of::<dyn PlanNode>()
                    .extract(&desired_captures)
                    .captured_as(&collected),
            ),
        ));

    let expected_left = scan("left");
    let expected_right = scan("right");
    let expected_parent = join(expected_left.clone(), expected_right.clone());
    let expected_root = join(expected_parent.clone(), scan("other"));

    let found = pattern.match_value(&expected_root);
    let Nodes(nodes) = found.capture(&collected).unwrap().unwrap();
    assert_eq!(
        nodes,
        &vec![expected_left, expected_right, expected_root, expected_parent]
    );
}

#[test]
fn no_match_means_no_captures() {
    let impossible = Capture::<u8>::new();
    let pattern = type_of::<u8>().captured_as(&impossible);

    let found = pattern.match_value(&Value::new(42_i32));

    assert!(found.is_empty());
    let error = found.capture(&impossible).unwrap_err();
    assert!(matches!(error, MatchError::EmptyMatchCapture { .. }));
    assert!(error.to_string().contains("empty match contains no value"));
}

#[test]
fn unknown_capture_is_an_error() {
    let unknown = Capture::<i32>::labeled("unknown");
    let found = any().match_value(&Value::new(42_i32));

    let error = found.capture(&unknown).unwrap_err();
    assert_eq!(
        error,
        MatchError::UnknownCapture {
            capture: unknown.describe()
        }
    );
    assert!(error.to_string().contains("unknown capture"));
    assert!(error.to_string().contains("unknown"));
}

#[test]
fn nested_captures_merge_last_wins() {
    let node = Capture::<dyn PlanNode>::new();
    let pattern = type_of::<dyn PlanNode>()
        .captured_as(&node)
        .matching(&type_of::<dyn PlanNode>().with(&source().captured_as(&node)));

    let found = pattern.match_value(&project(scan("t")));
    assert_eq!(found.captures().map(Captures::len), Some(1));
    let captured = found.capture(&node).unwrap().map(|node| node.sources().len());
    assert_eq!(captured, Some(0));
}

#[test]
fn tracing_matcher_gives_the_same_captures() {
    init_tracing();
    let scan_capture = Capture::<ScanNode>::new();
    let pattern = type_of::<ProjectNode>()
        .with(&source().of_type::<FilterNode>())
        .with(&source().matching(&any().matching(&type_of::<FilterNode>().with(
            &source().matching(&type_of::<ScanNode>().captured_as(&scan_capture)),
        ))));

    for tree in [project(filter(scan("t"))), project(scan("t")), Value::null()] {
        let plain = pattern.match_value(&tree);
        let traced = pattern.match_using(&TracingMatcher, &tree, &Captures::empty());
        assert_eq!(plain, traced);
    }
}
