//! In-memory relations and the join engine behind the merge designer.
//!
//! This crate focuses on:
//! - a typed cell/column/relation model (rows are positional and always full width),
//! - a pure join engine ([`join`]) with inner/left/right/outer semantics and
//!   source-qualified output columns (`relation.column`),
//! - an owned working set ([`RelationStore`]) that appends merged relations under fresh ids.

#![forbid(unsafe_code)]

mod error;
mod join;
mod model;
mod options;
mod records;
pub mod seed;
mod store;
mod value;

pub use crate::error::{MergeError, MergeResult};
pub use crate::join::{
    join, join_relations, merged_columns, merged_relation_name, JoinKind, JoinSpec,
    RelationSource,
};
pub use crate::model::{Column, ColumnId, DataType, Relation, RelationId};
pub use crate::options::{JoinOptions, LookupStrategy};
pub use crate::records::{relations_from_json_str, relations_to_json_string, RelationRecords};
pub use crate::store::RelationStore;
pub use crate::value::CellValue;
