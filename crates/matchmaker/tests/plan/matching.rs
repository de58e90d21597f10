use matchmaker::{
    any, extract, nullable, optional_property, property, satisfies, type_of, Extractor, Match,
    Object, Pattern, Property, Value,
};
use pretty_assertions::assert_eq;

use crate::fixtures::{
    filter, join, project, scan, FilterNode, PlanNode, ProjectNode, ScanNode, SingleSourcePlanNode,
};

fn assert_match<T: ?Sized>(pattern: &Pattern<T>, value: &Value) {
    let found = pattern.match_value(value);
    assert_eq!(found.raw_value(), Some(value), "expected {value:?} to match {pattern:?}");
}

fn assert_no_match<T: ?Sized>(pattern: &Pattern<T>, value: &Value) {
    assert_eq!(pattern.match_value(value), Match::empty());
}

fn source() -> Property<dyn SingleSourcePlanNode, dyn PlanNode> {
    property::<dyn SingleSourcePlanNode, dyn PlanNode, _>(|node| node.source())
}

#[test]
fn trivial_matchers() {
    assert_match(&any(), &Value::new(42_i32));
    assert_match(&any(), &Value::new("John Doe"));

    assert_match(&type_of::<i32>(), &Value::new(42_i32));
    assert_match(&type_of::<dyn PlanNode>(), &scan("t"));
    assert_no_match(&type_of::<i32>(), &Value::new("John Doe"));

    assert_match(&satisfies::<i32>(|x| *x > 0), &Value::new(42_i32));
    assert_no_match(&satisfies::<i32>(|x| *x > 0), &Value::new(-1_i32));
}

#[test]
fn match_object() {
    assert_match(&type_of::<ProjectNode>(), &project(Value::null()));
    assert_no_match(&type_of::<ProjectNode>(), &scan("t"));
}

#[test]
fn property_matchers() {
    let length_one = property::<String, usize, _>(String::len)
        .matching(&satisfies::<usize>(|length| *length == 1));
    let pattern = type_of::<String>().with(&length_one);
    assert_match(&pattern, &Value::new(String::from("a")));
    assert_no_match(&pattern, &Value::new(String::from("aa")));
}

#[test]
fn match_nested_properties() {
    let pattern = type_of::<ProjectNode>().with(&source().of_type::<ScanNode>());

    assert_match(&pattern, &project(scan("t")));
    assert_no_match(&pattern, &scan("t"));
    assert_no_match(&pattern, &project(Value::null()));
    assert_no_match(&pattern, &project(project(Value::null())));
}

fn lowercase_chars() -> Extractor<String, Vec<String>> {
    Extractor::assuming_type(|text: &String| {
        let lowercase: Vec<String> = text
            .chars()
            .map(String::from)
            .filter(|c| c.to_lowercase() == *c)
            .collect();
        (!lowercase.is_empty()).then_some(lowercase)
    })
}

#[test]
fn match_additional_properties() {
    let lowercase = matchmaker::Capture::<Vec<String>>::new();
    let text = "A little string.";

    let pattern = type_of::<String>()
        .filter(|s| s.starts_with('A'))
        .filter(|s| s.ends_with('.'))
        .with(
            &Property::<String, String>::identity()
                .matching(&type_of::<String>().extract(&lowercase_chars()).captured_as(&lowercase)),
        )
        .matching(&matchmaker::equal_to(text.to_owned()));

    let found = pattern.match_value(&Value::new(text.to_owned()));
    assert_eq!(found.value(), Some(&text.to_owned()));
    let expected: Vec<String> = " little string.".chars().map(String::from).collect();
    assert_eq!(found.capture(&lowercase), Ok(Some(&expected)));
}

#[test]
fn optional_properties() {
    let only_source = optional_property::<dyn PlanNode, dyn Object, _>(|node| {
        let sources = node.sources();
        match sources.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        }
    });
    let exactly_one_source = type_of::<dyn PlanNode>().with(&only_source.matching(&any()));

    assert_match(&exactly_one_source, &project(scan("t")));
    assert_no_match(&exactly_one_source, &scan("t"));
    assert_no_match(&exactly_one_source, &join(scan("a"), scan("b")));
    // A single null source is absent.
    assert_no_match(&exactly_one_source, &filter(Value::null()));
}

#[test]
fn evidence_backed_matching_using_extractors() {
    let vowels_of = Extractor::<String, Vec<String>>::assuming_type(|text| {
        let vowels: Vec<String> = text
            .chars()
            .filter(|c| "aeiouy".contains(c.to_ascii_lowercase()))
            .map(String::from)
            .collect();
        (!vowels.is_empty()).then_some(vowels)
    });
    let vowels = matchmaker::Capture::<Vec<String>>::new();
    let pattern = extract(&vowels_of).captured_as(&vowels);

    let found = pattern.match_value(&Value::new(String::from("John Doe")));
    let expected = vec!["o".to_owned(), "o".to_owned(), "e".to_owned()];
    assert_eq!(found.value(), Some(&expected));
    assert_eq!(found.capture(&vowels), Ok(found.value()));

    assert_no_match(&extract(&vowels_of), &Value::new(String::from("pqrst")));
}

#[test]
fn null_not_matched_by_default() {
    assert_no_match(&any(), &Value::null());
    assert_no_match(&type_of::<i32>(), &Value::null());
    assert_no_match(&type_of::<FilterNode>().with(&source().matching(&any())), &Value::null());

    let accept_null = Extractor::<dyn Object, dyn Object>::raw(|value, _| Some(value.clone()));
    assert_match(&extract(&accept_null), &Value::null());
    assert_match(&nullable::<ScanNode>(), &Value::null());
    assert_no_match(&nullable::<ScanNode>(), &project(Value::null()));
}
