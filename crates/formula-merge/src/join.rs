//! Key-based join of two relations.
//!
//! A join resolves both key columns, pairs up row positions according to the [`JoinKind`], and
//! only then materializes the output rows, so an error never leaves a half-built relation behind.
//!
//! Keys are compared by their text form ([`CellValue::key_text`]): `55` joins with `"55"`, and a
//! null key joins with another null key.
//!
//! [`JoinKind::Outer`] is a left join followed by every right row that no left row matched. The
//! matched set is tracked per right-row position during the left pass, so two right rows that
//! share a key value are accounted for independently and no right row is emitted twice.
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{MergeError, MergeResult};
use crate::model::{Column, ColumnId, Relation, RelationId};
use crate::options::JoinOptions;
use crate::value::CellValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Outer,
}

impl JoinKind {
    pub const ALL: [JoinKind; 4] = [
        JoinKind::Inner,
        JoinKind::Left,
        JoinKind::Right,
        JoinKind::Outer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Right => "right",
            JoinKind::Outer => "outer",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinKind {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JoinKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| MergeError::InvalidJoinKind(s.to_string()))
    }
}

impl TryFrom<String> for JoinKind {
    type Error = MergeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JoinKind> for &'static str {
    fn from(value: JoinKind) -> Self {
        value.as_str()
    }
}

/// Which relations to join, how, and on which key columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub left_relation_id: RelationId,
    pub right_relation_id: RelationId,
    pub kind: JoinKind,
    pub left_key_column_id: ColumnId,
    pub right_key_column_id: ColumnId,
}

impl JoinSpec {
    pub fn new(
        left_relation_id: impl Into<RelationId>,
        right_relation_id: impl Into<RelationId>,
        kind: JoinKind,
        left_key_column_id: impl Into<ColumnId>,
        right_key_column_id: impl Into<ColumnId>,
    ) -> Self {
        Self {
            left_relation_id: left_relation_id.into(),
            right_relation_id: right_relation_id.into(),
            kind,
            left_key_column_id: left_key_column_id.into(),
            right_key_column_id: right_key_column_id.into(),
        }
    }
}

/// Anything that can resolve relation ids, e.g. a [`crate::RelationStore`] or a slice.
pub trait RelationSource {
    fn relation(&self, id: &RelationId) -> Option<&Relation>;
}

impl RelationSource for [Relation] {
    fn relation(&self, id: &RelationId) -> Option<&Relation> {
        self.iter().find(|r| r.id() == id)
    }
}

impl RelationSource for Vec<Relation> {
    fn relation(&self, id: &RelationId) -> Option<&Relation> {
        self.as_slice().relation(id)
    }
}

/// Resolve both relations of `spec` from `source` and join them.
pub fn join<S>(
    source: &S,
    spec: &JoinSpec,
    output_id: RelationId,
    options: &JoinOptions,
) -> MergeResult<Relation>
where
    S: RelationSource + ?Sized,
{
    let left = source
        .relation(&spec.left_relation_id)
        .ok_or_else(|| MergeError::UnknownRelation(spec.left_relation_id.clone()))?;
    let right = source
        .relation(&spec.right_relation_id)
        .ok_or_else(|| MergeError::UnknownRelation(spec.right_relation_id.clone()))?;
    join_relations(left, right, spec, output_id, options)
}

/// Join two already-resolved relations.
///
/// `left` and `right` must be the relations `spec` names.
pub fn join_relations(
    left: &Relation,
    right: &Relation,
    spec: &JoinSpec,
    output_id: RelationId,
    options: &JoinOptions,
) -> MergeResult<Relation> {
    if left.id() != &spec.left_relation_id {
        return Err(MergeError::UnknownRelation(spec.left_relation_id.clone()));
    }
    if right.id() != &spec.right_relation_id {
        return Err(MergeError::UnknownRelation(spec.right_relation_id.clone()));
    }

    let left_key = key_position(left, &spec.left_key_column_id)?;
    let right_key = key_position(right, &spec.right_key_column_id)?;

    let pairs = pair_rows(left, left_key, right, right_key, spec.kind, options);

    let width = left.column_count() + right.column_count();
    let mut rows = Vec::with_capacity(pairs.len());
    let mut right_only = 0usize;
    for (l, r) in pairs {
        let mut row = Vec::with_capacity(width);
        push_side(&mut row, left, l);
        push_side(&mut row, right, r);
        if l.is_none() && spec.kind == JoinKind::Outer {
            right_only += 1;
        }
        rows.push(row);
    }

    log::debug!(
        "{} join {} x {} on {}/{}: {} rows ({} right-only)",
        spec.kind,
        left.id(),
        right.id(),
        spec.left_key_column_id,
        spec.right_key_column_id,
        rows.len(),
        right_only
    );

    Ok(Relation::from_parts(
        output_id,
        merged_relation_name(left, right),
        merged_columns(left, right),
        rows,
    ))
}

/// Output schema of joining `left` with `right`, without evaluating any rows.
///
/// Left columns come first, then right columns. Names are `relation.column`; ids are
/// `merged_{relation id}_{column id}`, with a `#n` suffix when a self-join repeats an id.
pub fn merged_columns(left: &Relation, right: &Relation) -> Vec<Column> {
    let mut seen = HashSet::with_capacity(left.column_count() + right.column_count());
    let mut out = Vec::with_capacity(left.column_count() + right.column_count());
    for relation in [left, right] {
        for column in relation.columns() {
            let base = format!("merged_{}_{}", relation.id(), column.id);
            let mut id = base.clone();
            let mut n = 1;
            while !seen.insert(id.clone()) {
                n += 1;
                id = format!("{base}#{n}");
            }
            out.push(Column::new(
                id,
                format!("{}.{}", relation.name(), column.name),
                column.data_type,
            ));
        }
    }
    out
}

pub fn merged_relation_name(left: &Relation, right: &Relation) -> String {
    format!("{}_{}", left.name(), right.name())
}

fn key_position(relation: &Relation, column: &ColumnId) -> MergeResult<usize> {
    relation
        .column_position(column.as_str())
        .ok_or_else(|| MergeError::UnknownKeyColumn {
            relation: relation.id().clone(),
            column: column.clone(),
        })
}

fn push_side(row: &mut Vec<CellValue>, relation: &Relation, source_row: Option<usize>) {
    match source_row.and_then(|idx| relation.row(idx)) {
        Some(values) => row.extend_from_slice(values),
        None => row.resize(row.len() + relation.column_count(), CellValue::Null),
    }
}

fn key_texts(relation: &Relation, key: usize) -> Vec<Cow<'_, str>> {
    relation
        .rows()
        .iter()
        .map(|row| row.get(key).map_or(Cow::Borrowed("null"), CellValue::key_text))
        .collect()
}

/// Row-position pairs in output order. `None` marks the null-filled side.
fn pair_rows(
    left: &Relation,
    left_key: usize,
    right: &Relation,
    right_key: usize,
    kind: JoinKind,
    options: &JoinOptions,
) -> Vec<(Option<usize>, Option<usize>)> {
    let mut pairs = Vec::new();

    if kind == JoinKind::Right {
        let lookup = KeyLookup::build(key_texts(left, left_key), options);
        for (r, key) in key_texts(right, right_key).iter().enumerate() {
            let before = pairs.len();
            pairs.extend(lookup.matches(key).map(|l| (Some(l), Some(r))));
            if pairs.len() == before {
                pairs.push((None, Some(r)));
            }
        }
        return pairs;
    }

    let lookup = KeyLookup::build(key_texts(right, right_key), options);
    let mut right_matched = vec![false; right.row_count()];
    for (l, key) in key_texts(left, left_key).iter().enumerate() {
        let before = pairs.len();
        for r in lookup.matches(key) {
            right_matched[r] = true;
            pairs.push((Some(l), Some(r)));
        }
        if pairs.len() == before && kind != JoinKind::Inner {
            pairs.push((Some(l), None));
        }
    }

    if kind == JoinKind::Outer {
        pairs.extend(
            right_matched
                .iter()
                .enumerate()
                .filter(|(_, matched)| !**matched)
                .map(|(r, _)| (None, Some(r))),
        );
    }

    pairs
}

/// Key texts of the probed side, optionally indexed.
enum KeyLookup<'a> {
    Scan(Vec<Cow<'a, str>>),
    Index(HashMap<Cow<'a, str>, Vec<usize>>),
}

impl<'a> KeyLookup<'a> {
    fn build(keys: Vec<Cow<'a, str>>, options: &JoinOptions) -> Self {
        if !options.uses_hash_index(keys.len()) {
            return KeyLookup::Scan(keys);
        }

        let mut index: HashMap<Cow<'a, str>, Vec<usize>> = HashMap::new();
        for (pos, key) in keys.into_iter().enumerate() {
            index.entry(key).or_default().push(pos);
        }
        KeyLookup::Index(index)
    }

    /// Matching row positions in ascending order.
    fn matches<'s>(&'s self, probe: &'s str) -> Matches<'s> {
        match self {
            KeyLookup::Scan(keys) => Matches::Scan {
                keys: keys.iter().enumerate(),
                probe,
            },
            KeyLookup::Index(index) => {
                Matches::Index(index.get(probe).map_or(&[][..], Vec::as_slice).iter())
            }
        }
    }
}

enum Matches<'s> {
    Scan {
        keys: std::iter::Enumerate<std::slice::Iter<'s, Cow<'s, str>>>,
        probe: &'s str,
    },
    Index(std::slice::Iter<'s, usize>),
}

impl Iterator for Matches<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            Matches::Scan { keys, probe } => {
                keys.find_map(|(pos, key)| (&**key == *probe).then_some(pos))
            }
            Matches::Index(positions) => positions.next().copied(),
        }
    }
}
