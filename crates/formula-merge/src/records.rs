//! JSON import/export of relations in "records" shape.
//!
//! ```json
//! [{
//!   "id": "t1",
//!   "name": "orders_q1",
//!   "columns": [{ "id": "c1", "name": "order_id", "type": "Integer" }],
//!   "data": [{ "order_id": 1001 }]
//! }]
//! ```
//!
//! Record fields are keyed by column name and coerced to the column's declared type. Missing
//! fields and JSON `null` become [`CellValue::Null`].
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};
use std::collections::HashSet;

use crate::error::{MergeError, MergeResult};
use crate::model::{Column, DataType, Relation, RelationId};
use crate::value::{number_text, CellValue};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationRecords {
    pub id: RelationId,
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub data: Vec<Map<String, JsonValue>>,
}

impl TryFrom<RelationRecords> for Relation {
    type Error = MergeError;

    fn try_from(records: RelationRecords) -> Result<Self, Self::Error> {
        let RelationRecords {
            id,
            name,
            columns,
            data,
        } = records;

        let mut relation = Relation::new(id, name, columns)?;
        for record in &data {
            let cells = record
                .iter()
                .map(|(field, value)| -> MergeResult<_> {
                    let cell = match relation.column_index(field) {
                        Some(idx) => cell_from_json(relation.id(), &relation.columns()[idx], value)?,
                        // push_record reports the unknown name.
                        None => CellValue::Null,
                    };
                    Ok((field, cell))
                })
                .collect::<MergeResult<Vec<_>>>()?;
            relation.push_record(cells)?;
        }
        Ok(relation)
    }
}

impl From<&Relation> for RelationRecords {
    /// Records are keyed by column name, so of several same-named columns the last one wins.
    fn from(relation: &Relation) -> Self {
        let distinct_names: HashSet<&str> =
            relation.columns().iter().map(|c| c.name.as_str()).collect();
        if distinct_names.len() != relation.column_count() && relation.row_count() > 0 {
            log::warn!(
                "relation {} repeats column names; exported records keep the last value per name",
                relation.id()
            );
        }

        let data = (0..relation.row_count())
            .filter_map(|row| relation.record(row))
            .map(|record| {
                record
                    .map(|(column, value)| (column.name.clone(), cell_to_json(column, value)))
                    .collect()
            })
            .collect();

        Self {
            id: relation.id().clone(),
            name: relation.name().to_string(),
            columns: relation.columns().to_vec(),
            data,
        }
    }
}

impl Serialize for Relation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        RelationRecords::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Relation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let records = RelationRecords::deserialize(deserializer)?;
        Relation::try_from(records).map_err(serde::de::Error::custom)
    }
}

/// Parse a JSON array of relations in records shape.
pub fn relations_from_json_str(json: &str) -> MergeResult<Vec<Relation>> {
    let records: Vec<RelationRecords> =
        serde_json::from_str(json).map_err(|err| MergeError::Json(err.to_string()))?;
    records.into_iter().map(Relation::try_from).collect()
}

pub fn relations_to_json_string<'a>(
    relations: impl IntoIterator<Item = &'a Relation>,
) -> MergeResult<String> {
    let records: Vec<RelationRecords> = relations.into_iter().map(RelationRecords::from).collect();
    serde_json::to_string_pretty(&records).map_err(|err| MergeError::Json(err.to_string()))
}

fn cell_from_json(relation: &RelationId, column: &Column, value: &JsonValue) -> MergeResult<CellValue> {
    let invalid = || MergeError::InvalidValue {
        relation: relation.clone(),
        column: column.name.clone(),
        expected: column.data_type,
        value: value.to_string(),
    };

    if value.is_null() {
        return Ok(CellValue::Null);
    }

    match column.data_type {
        DataType::String => match value {
            JsonValue::String(s) => Ok(CellValue::String(s.clone())),
            JsonValue::Number(n) => n
                .as_f64()
                .map(|n| CellValue::String(number_text(n)))
                .ok_or_else(invalid),
            JsonValue::Bool(b) => Ok(CellValue::String(b.to_string())),
            _ => Err(invalid()),
        },
        DataType::Integer | DataType::Float => {
            let n = match value {
                JsonValue::Number(n) => n.as_f64(),
                // `parse` also accepts "NaN" and "inf", which JSON cannot carry back out.
                JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
                _ => None,
            }
            .ok_or_else(invalid)?;
            if column.data_type == DataType::Integer && n.fract() != 0.0 {
                return Err(invalid());
            }
            Ok(CellValue::Number(n))
        }
        DataType::Date => match value {
            JsonValue::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(CellValue::Date)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        },
        DataType::Boolean => match value {
            JsonValue::Bool(b) => Ok(CellValue::Boolean(*b)),
            _ => Err(invalid()),
        },
    }
}

fn cell_to_json(column: &Column, value: &CellValue) -> JsonValue {
    match value {
        CellValue::Null => JsonValue::Null,
        CellValue::String(s) => JsonValue::String(s.clone()),
        CellValue::Number(n) => {
            // Keep integer columns integral in the output (`1001`, not `1001.0`).
            if column.data_type == DataType::Integer
                && n.fract() == 0.0
                && n.abs() <= i64::MAX as f64
            {
                JsonValue::Number(Number::from(*n as i64))
            } else {
                Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number)
            }
        }
        CellValue::Boolean(b) => JsonValue::Bool(*b),
        CellValue::Date(_) => JsonValue::String(value.key_text().into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(data_type: DataType) -> Column {
        Column::new("c", "v", data_type)
    }

    #[test]
    fn numbers_are_stringified_for_text_columns() {
        let id = RelationId::new("t");
        assert_eq!(
            cell_from_json(&id, &column(DataType::String), &json!(55)).unwrap(),
            CellValue::from("55")
        );
        assert_eq!(
            cell_from_json(&id, &column(DataType::String), &json!(true)).unwrap(),
            CellValue::from("true")
        );
    }

    #[test]
    fn integer_columns_reject_fractions() {
        let id = RelationId::new("t");
        assert_eq!(
            cell_from_json(&id, &column(DataType::Integer), &json!("12")).unwrap(),
            CellValue::from(12)
        );
        let err = cell_from_json(&id, &column(DataType::Integer), &json!(1.5)).unwrap_err();
        assert!(matches!(
            err,
            MergeError::InvalidValue {
                expected: DataType::Integer,
                ..
            }
        ));
    }

    #[test]
    fn dates_need_iso_format() {
        let id = RelationId::new("t");
        assert!(cell_from_json(&id, &column(DataType::Date), &json!("2023-01-15")).is_ok());
        assert!(cell_from_json(&id, &column(DataType::Date), &json!("15/01/2023")).is_err());
        assert!(cell_from_json(&id, &column(DataType::Boolean), &json!("true")).is_err());
    }

    #[test]
    fn integers_export_without_fraction() {
        assert_eq!(
            cell_to_json(&column(DataType::Integer), &CellValue::from(1001)),
            json!(1001)
        );
        assert_eq!(
            cell_to_json(&column(DataType::Float), &CellValue::from(240.5)),
            json!(240.5)
        );
        assert_eq!(
            cell_to_json(&column(DataType::Float), &CellValue::from(f64::NAN)),
            JsonValue::Null
        );
    }
}
