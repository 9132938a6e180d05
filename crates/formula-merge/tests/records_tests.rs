use chrono::NaiveDate;
use formula_merge::{
    join, relations_from_json_str, relations_to_json_string, seed, CellValue, DataType, JoinKind,
    JoinOptions, JoinSpec, MergeError, Relation,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const WORKING_SET: &str = r#"[
  {
    "id": "inv",
    "name": "invoices",
    "columns": [
      { "id": "i1", "name": "invoice_id", "type": "Integer" },
      { "id": "i2", "name": "customer", "type": "String" },
      { "id": "i3", "name": "issued", "type": "Date" },
      { "id": "i4", "name": "paid", "type": "Boolean" },
      { "id": "i5", "name": "amount", "type": "Float" }
    ],
    "data": [
      { "invoice_id": 1, "customer": 55, "issued": "2023-04-01", "paid": true, "amount": 10.5 },
      { "invoice_id": "2", "customer": "12", "paid": false },
      { "invoice_id": 3, "customer": null, "issued": null, "amount": "7" }
    ]
  }
]"#;

#[test]
fn records_are_coerced_to_declared_types() {
    let relations = relations_from_json_str(WORKING_SET).unwrap();
    assert_eq!(relations.len(), 1);
    let invoices = &relations[0];

    assert_eq!(invoices.name(), "invoices");
    assert_eq!(invoices.row_count(), 3);
    assert_eq!(
        invoices.row(0).unwrap(),
        &[
            CellValue::Number(1.0),
            CellValue::String("55".into()),
            CellValue::Date(NaiveDate::from_ymd_opt(2023, 4, 1).unwrap()),
            CellValue::Boolean(true),
            CellValue::Number(10.5),
        ][..]
    );
    assert_eq!(
        invoices.row(1).unwrap(),
        &[
            CellValue::Number(2.0),
            CellValue::String("12".into()),
            CellValue::Null,
            CellValue::Boolean(false),
            CellValue::Null,
        ][..]
    );
    assert_eq!(invoices.value(2, "customer"), Some(&CellValue::Null));
    assert_eq!(invoices.value(2, "amount"), Some(&CellValue::Number(7.0)));
}

#[test]
fn unknown_fields_are_rejected() {
    let json = r#"[{
        "id": "t", "name": "t",
        "columns": [{ "id": "a", "name": "a", "type": "String" }],
        "data": [{ "a": "x", "b": "y" }]
    }]"#;
    let err = relations_from_json_str(json).unwrap_err();
    assert_eq!(
        err,
        MergeError::UnknownColumn {
            relation: "t".into(),
            column: "b".into(),
        }
    );
}

#[test]
fn type_mismatches_name_the_column() {
    let json = r#"[{
        "id": "t", "name": "t",
        "columns": [{ "id": "d", "name": "when", "type": "Date" }],
        "data": [{ "when": 20230101 }]
    }]"#;
    let err = relations_from_json_str(json).unwrap_err();
    assert_eq!(
        err,
        MergeError::InvalidValue {
            relation: "t".into(),
            column: "when".into(),
            expected: DataType::Date,
            value: "20230101".into(),
        }
    );
}

#[test]
fn malformed_json_is_a_json_error() {
    let err = relations_from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, MergeError::Json(_)));

    let err = relations_from_json_str(r#"[{ "id": "t", "name": "t", "columns": [{ "id": "a", "name": "a", "type": "Text" }] }]"#)
        .unwrap_err();
    assert!(matches!(err, MergeError::Json(_)));
}

#[test]
fn seed_relations_export_in_records_shape() {
    let relations = seed::seed_relations();
    let exported = relations_to_json_string(&relations).unwrap();
    let value: serde_json::Value = serde_json::from_str(&exported).unwrap();

    assert_eq!(value[0]["id"], json!("t1"));
    assert_eq!(
        value[0]["columns"][3],
        json!({ "id": "c4", "name": "order_date", "type": "Date" })
    );
    assert_eq!(
        value[0]["data"][0],
        json!({
            "order_id": 1001,
            "customer_id": 55,
            "total_amount": 240.5,
            "order_date": "2023-01-15",
            "status": "Shipped"
        })
    );

    let reloaded = relations_from_json_str(&exported).unwrap();
    assert_eq!(reloaded, relations);
}

#[test]
fn relation_implements_serde_through_records() {
    let relations = seed::seed_relations();
    let value = serde_json::to_value(&relations[1]).unwrap();
    assert_eq!(value["name"], json!("customers_master"));
    assert_eq!(value["data"][2]["full_name"], json!("Charlie Brown"));

    let back: Relation = serde_json::from_value(value).unwrap();
    assert_eq!(back, relations[1]);
}

#[test]
fn non_finite_number_strings_are_rejected() {
    for text in ["NaN", "inf", "-infinity"] {
        let json = format!(
            r#"[{{
                "id": "t", "name": "t",
                "columns": [{{ "id": "v", "name": "v", "type": "Float" }}],
                "data": [{{ "v": "{text}" }}]
            }}]"#
        );
        let err = relations_from_json_str(&json).unwrap_err();
        assert_eq!(
            err,
            MergeError::InvalidValue {
                relation: "t".into(),
                column: "v".into(),
                expected: DataType::Float,
                value: format!("\"{text}\""),
            }
        );
    }

    // Finite numeric strings still parse, and the export re-imports unchanged.
    let json = r#"[{
        "id": "t", "name": "t",
        "columns": [{ "id": "v", "name": "v", "type": "Float" }],
        "data": [{ "v": " 1e3 " }, { "v": "-0.25" }]
    }]"#;
    let relations = relations_from_json_str(json).unwrap();
    assert_eq!(relations[0].value(0, "v"), Some(&CellValue::Number(1000.0)));
    let reloaded = relations_from_json_str(&relations_to_json_string(&relations).unwrap()).unwrap();
    assert_eq!(reloaded, relations);
}

#[test]
fn self_join_export_keeps_last_value_per_column_name() {
    let relations = seed::seed_relations();
    let merged = join(
        &relations,
        &JoinSpec::new("t2", "t2", JoinKind::Inner, "c6", "c6"),
        "self".into(),
        &JoinOptions::default(),
    )
    .unwrap();
    assert_eq!(merged.column_count(), 8);

    let value = serde_json::to_value(&merged).unwrap();
    let first = value["data"][0].as_object().unwrap();
    // Both sides name their columns `customers_master.*`, so only four keys survive.
    assert_eq!(first.len(), 4);
    assert_eq!(first["customers_master.full_name"], json!("Alice Johnson"));
    assert_eq!(value["columns"].as_array().unwrap().len(), 8);
}
