use chrono::NaiveDate;
use formula_merge::{
    join, CellValue, Column, DataType, JoinKind, JoinOptions, JoinSpec, LookupStrategy, Relation,
};

fn single_key(id: &str, data_type: DataType, keys: Vec<CellValue>) -> Relation {
    let mut relation = Relation::new(id, id, vec![Column::new("k", "key", data_type)]).unwrap();
    for key in keys {
        relation.push_row(vec![key]).unwrap();
    }
    relation
}

/// Inner-join row count for a single left key against a single right key, checked under both
/// lookup strategies.
fn matches(left: CellValue, right: CellValue) -> bool {
    let relations = vec![
        single_key("l", DataType::String, vec![left]),
        single_key("r", DataType::String, vec![right]),
    ];
    let spec = JoinSpec::new("l", "r", JoinKind::Inner, "k", "k");

    let counts: Vec<usize> = [LookupStrategy::NestedLoop, LookupStrategy::HashIndex]
        .into_iter()
        .map(|strategy| {
            join(
                &relations,
                &spec,
                "out".into(),
                &JoinOptions::with_strategy(strategy),
            )
            .unwrap()
            .row_count()
        })
        .collect();
    assert_eq!(counts[0], counts[1], "strategies disagree");
    counts[0] == 1
}

#[test]
fn integer_matches_its_text_form() {
    assert!(matches(55.into(), "55".into()));
    assert!(matches("55".into(), 55.into()));
    assert!(matches(55.0.into(), "55".into()));
}

#[test]
fn text_comparison_is_exact() {
    assert!(!matches(55.into(), "55.0".into()));
    assert!(!matches(55.into(), " 55".into()));
    assert!(!matches("abc".into(), "ABC".into()));
}

#[test]
fn fractional_numbers_use_shortest_form() {
    assert!(matches(240.5.into(), "240.5".into()));
    assert!(matches(120.0.into(), "120".into()));
    assert!(!matches(120.0.into(), "120.00".into()));
}

#[test]
fn negative_zero_matches_zero() {
    assert!(matches((-0.0).into(), 0.into()));
    assert!(matches((-0.0).into(), "0".into()));
}

#[test]
fn null_keys_match_each_other_and_the_text_null() {
    assert!(matches(CellValue::Null, CellValue::Null));
    assert!(matches(CellValue::Null, "null".into()));
    assert!(!matches(CellValue::Null, "".into()));
}

#[test]
fn booleans_and_dates_compare_by_text() {
    assert!(matches(true.into(), "true".into()));
    assert!(!matches(true.into(), 1.into()));

    let date = NaiveDate::from_ymd_opt(2023, 3, 5).unwrap();
    assert!(matches(date.into(), "2023-03-05".into()));
    assert!(!matches(date.into(), "2023-3-5".into()));
}

#[test]
fn mixed_type_keys_join_across_relations() {
    let mut orders = Relation::new(
        "o",
        "orders",
        vec![
            Column::new("id", "order_id", DataType::Integer),
            Column::new("cust", "customer", DataType::Integer),
        ],
    )
    .unwrap();
    orders.push_row(vec![1.into(), 55.into()]).unwrap();
    orders.push_row(vec![2.into(), 7.into()]).unwrap();

    let mut crm = Relation::new(
        "c",
        "crm",
        vec![
            Column::new("ref", "ref", DataType::String),
            Column::new("name", "name", DataType::String),
        ],
    )
    .unwrap();
    crm.push_row(vec!["55".into(), "Alice".into()]).unwrap();
    crm.push_row(vec!["007".into(), "Bond".into()]).unwrap();

    let relations = vec![orders, crm];
    let merged = join(
        &relations,
        &JoinSpec::new("o", "c", JoinKind::Left, "cust", "ref"),
        "out".into(),
        &JoinOptions::default(),
    )
    .unwrap();

    assert_eq!(merged.row_count(), 2);
    assert_eq!(
        merged.value(0, "crm.name"),
        Some(&CellValue::from("Alice"))
    );
    // "007" is not the text form of 7.
    assert_eq!(merged.value(1, "crm.name"), Some(&CellValue::Null));
}
