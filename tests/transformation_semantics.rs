//! End-to-end semantics of the transformation runner: round-tripping,
//! entry precedence, unset suppression, and coercion.

use recast::{
    ColumnConversion, ColumnType, Format, Mapping, MappingSpec, OperatorTable, Row,
    TransformationEntry, TransformationPipeline, TransformationRunner, TransformationSet, Value,
};

fn bidirectional_mapping() -> Mapping {
    let spec = MappingSpec::new(Format::named("a"), Format::named("b"))
        .with_forward(TransformationSet::from_pairs([
            ("c", vec![TransformationEntry::new("a * 2")]),
            ("d", vec![TransformationEntry::new("b + 3")]),
        ]))
        .with_reverse(TransformationSet::from_pairs([
            ("a", vec![TransformationEntry::new("c / 2")]),
            ("b", vec![TransformationEntry::new("d - 3")]),
        ]));
    Mapping::new(vec![spec])
}

fn run(mapping: &Mapping, input: &str, output: &str, rows: Vec<Row>) -> Vec<Row> {
    let path = mapping
        .resolve_path(&Format::named(input), &Format::named(output))
        .unwrap();
    let pipeline = TransformationPipeline::compile(path).unwrap();
    let table = OperatorTable::standard();
    TransformationRunner::new(&table).run(&pipeline, rows).unwrap()
}

#[test]
fn round_trip_reproduces_rows_exactly() {
    let mapping = bidirectional_mapping();
    let original = vec![
        Row::from([("a", Value::Int(1)), ("b", Value::Int(2))]),
        Row::from([("a", Value::Int(3)), ("b", Value::Int(4))]),
    ];

    let forward = run(&mapping, "a", "b", original.clone());
    assert_eq!(
        forward,
        vec![
            Row::from([("c", Value::Int(2)), ("d", Value::Int(5))]),
            Row::from([("c", Value::Int(6)), ("d", Value::Int(7))]),
        ]
    );

    let back = run(&mapping, "b", "a", forward);
    assert_eq!(back, original);
}

#[test]
fn first_match_wins_over_later_entries() {
    let spec = MappingSpec::new(Format::named("a"), Format::named("b")).with_forward(
        TransformationSet::from_pairs([(
            "c",
            vec![
                TransformationEntry::when("a * 2", "a is 1"),
                TransformationEntry::when("a * 4", "True"),
            ],
        )]),
    );
    let mapping = Mapping::new(vec![spec]);

    let output = run(&mapping, "a", "b", vec![Row::from([("a", Value::Int(1))])]);
    assert_eq!(output[0].get("c"), Some(&Value::Int(2)));
}

#[test]
fn rows_with_no_matching_guard_are_suppressed() {
    let spec = MappingSpec::new(Format::named("a"), Format::named("b")).with_forward(
        TransformationSet::from_pairs([
            ("c", vec![TransformationEntry::when("a", "a is 1 and b is 2")]),
            ("d", vec![TransformationEntry::when("b", "a is 5 and b is 6")]),
        ]),
    );
    let mapping = Mapping::new(vec![spec]);

    let output = run(
        &mapping,
        "a",
        "b",
        vec![Row::from([("a", Value::Int(3)), ("b", Value::Int(4))])],
    );
    assert!(output.is_empty(), "row must be dropped, not emitted as nulls");
}

#[test]
fn null_sentinels_and_cast_failures() {
    let mut spec = MappingSpec::new(Format::named("a"), Format::named("b")).with_forward(
        TransformationSet::from_pairs([("out", vec![TransformationEntry::new("a")])]),
    );
    if let Some(forward) = spec.forward.as_mut() {
        forward.conversions.insert(
            "a".to_string(),
            ColumnConversion::new(ColumnType::Int)
                .nullable(vec![Value::Null, Value::Str("NULL".into())]),
        );
    }
    let mapping = Mapping::new(vec![spec]);

    let output = run(
        &mapping,
        "a",
        "b",
        vec![
            Row::from([("a", Value::Str("1".into()))]),
            Row::from([("a", Value::Float(3.1))]),
            Row::from([("a", Value::Null)]),
            Row::from([("a", Value::Str("NULL".into()))]),
            Row::from([("a", Value::Str("foo".into()))]),
        ],
    );

    // "foo" fails its cast and the whole row is dropped; exactly four remain.
    assert_eq!(output.len(), 4);
    assert_eq!(output[0].get("out"), Some(&Value::Int(1)));
    assert_eq!(output[1].get("out"), Some(&Value::Int(3)));
    assert_eq!(output[2].get("out"), Some(&Value::Null));
    assert_eq!(output[3].get("out"), Some(&Value::Null));
}

#[test]
fn multi_hop_paths_compose_in_order() {
    let ab = MappingSpec::new(Format::named("a"), Format::named("b")).with_forward(
        TransformationSet::from_pairs([("x", vec![TransformationEntry::new("n + 1")])]),
    );
    let bc = MappingSpec::new(Format::named("b"), Format::named("c")).with_forward(
        TransformationSet::from_pairs([("y", vec![TransformationEntry::new("x * 10")])]),
    );
    let mapping = Mapping::new(vec![ab, bc]);

    let output = run(&mapping, "a", "c", vec![Row::from([("n", Value::Int(4))])]);
    assert_eq!(output, vec![Row::from([("y", Value::Int(50))])]);
}

#[test]
fn resolved_pipelines_are_reusable_across_row_sets() {
    let mapping = bidirectional_mapping();
    let path = mapping
        .resolve_path(&Format::named("a"), &Format::named("b"))
        .unwrap();
    let pipeline = TransformationPipeline::compile(path).unwrap();
    let table = OperatorTable::standard();
    let runner = TransformationRunner::new(&table);

    let first = runner
        .run(&pipeline, vec![Row::from([("a", Value::Int(1)), ("b", Value::Int(1))])])
        .unwrap();
    let second = runner
        .run(&pipeline, vec![Row::from([("a", Value::Int(2)), ("b", Value::Int(2))])])
        .unwrap();
    let repeat = runner
        .run(&pipeline, vec![Row::from([("a", Value::Int(1)), ("b", Value::Int(1))])])
        .unwrap();

    // Shared parse state is not mutated by evaluation: re-running the same
    // rows yields identical results after unrelated rows went through.
    assert_eq!(first, repeat);
    assert_eq!(second[0].get("c"), Some(&Value::Int(4)));
}
