use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{MergeError, MergeResult};
use crate::value::CellValue;

/// Declared column type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    String,
    Integer,
    Float,
    Date,
    Boolean,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::String => "String",
            DataType::Integer => "Integer",
            DataType::Float => "Float",
            DataType::Date => "Date",
            DataType::Boolean => "Boolean",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a relation, unique across a working set.
    RelationId
);

string_id!(
    /// Identifier of a column, unique within its relation.
    ColumnId
);

/// A column definition. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl Column {
    pub fn new(id: impl Into<ColumnId>, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            data_type,
        }
    }
}

/// A named table of rows.
///
/// Rows are stored positionally, aligned to `columns`, so every row always carries exactly one
/// value per column. Lookups by column name resolve through a name index; when two columns share
/// a name the first one wins.
#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    id: RelationId,
    name: String,
    columns: Vec<Column>,
    name_index: HashMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
}

impl Relation {
    /// Create an empty relation. Column ids must be unique.
    pub fn new(
        id: impl Into<RelationId>,
        name: impl Into<String>,
        columns: Vec<Column>,
    ) -> MergeResult<Self> {
        let id = id.into();
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.id.as_str()) {
                return Err(MergeError::DuplicateColumn {
                    relation: id,
                    column: column.id.clone(),
                });
            }
        }

        Ok(Self::from_parts(id, name.into(), columns, Vec::new()))
    }

    /// Callers guarantee unique column ids and rows as wide as `columns`.
    pub(crate) fn from_parts(
        id: RelationId,
        name: String,
        columns: Vec<Column>,
        rows: Vec<Vec<CellValue>>,
    ) -> Self {
        let mut name_index = HashMap::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            if name_index.contains_key(&column.name) {
                log::warn!(
                    "relation {id} has more than one column named {:?}; lookups use the first",
                    column.name
                );
                continue;
            }
            name_index.insert(column.name.clone(), idx);
        }

        Self {
            id,
            name,
            columns,
            name_index,
            rows,
        }
    }

    pub fn id(&self) -> &RelationId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, row: usize) -> Option<&[CellValue]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// Position of the column with the given id.
    pub fn column_position(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id.as_str() == id)
    }

    /// Position of the first column with the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    pub fn value(&self, row: usize, column_name: &str) -> Option<&CellValue> {
        let idx = self.column_index(column_name)?;
        self.rows.get(row)?.get(idx)
    }

    /// Iterate one row as `(column, value)` pairs in column order.
    pub fn record(&self, row: usize) -> Option<impl Iterator<Item = (&Column, &CellValue)> + '_> {
        let values = self.rows.get(row)?;
        Some(self.columns.iter().zip(values))
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) -> MergeResult<()> {
        if row.len() != self.columns.len() {
            return Err(MergeError::SchemaMismatch {
                relation: self.id.clone(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a row given as `(column name, value)` pairs. Columns not mentioned are null.
    pub fn push_record<K, V>(&mut self, record: impl IntoIterator<Item = (K, V)>) -> MergeResult<()>
    where
        K: AsRef<str>,
        V: Into<CellValue>,
    {
        let mut row = vec![CellValue::Null; self.columns.len()];
        for (name, value) in record {
            let name = name.as_ref();
            let idx = self
                .column_index(name)
                .ok_or_else(|| MergeError::UnknownColumn {
                    relation: self.id.clone(),
                    column: name.to_string(),
                })?;
            row[idx] = value.into();
        }
        self.rows.push(row);
        Ok(())
    }
}
