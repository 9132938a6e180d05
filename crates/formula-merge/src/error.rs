use crate::model::{ColumnId, DataType, RelationId};

pub type MergeResult<T> = Result<T, MergeError>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MergeError {
    #[error("unknown relation: {0}")]
    UnknownRelation(RelationId),

    #[error("unknown key column {relation}[{column}]")]
    UnknownKeyColumn {
        relation: RelationId,
        column: ColumnId,
    },

    #[error("invalid join kind {0:?}: expected one of inner, left, right, outer")]
    InvalidJoinKind(String),

    #[error("duplicate relation: {0}")]
    DuplicateRelation(RelationId),

    #[error("duplicate column {relation}[{column}]")]
    DuplicateColumn {
        relation: RelationId,
        column: ColumnId,
    },

    #[error("unknown column {relation}[{column}]")]
    UnknownColumn { relation: RelationId, column: String },

    #[error("schema mismatch for {relation}: expected {expected} values, got {actual}")]
    SchemaMismatch {
        relation: RelationId,
        expected: usize,
        actual: usize,
    },

    #[error("invalid value for {relation}[{column}]: expected {expected}, got {value}")]
    InvalidValue {
        relation: RelationId,
        column: String,
        expected: DataType,
        value: String,
    },

    #[error("invalid relation json: {0}")]
    Json(String),
}
