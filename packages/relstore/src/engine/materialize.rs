use super::relation::{Cardinality, Relation};
use super::snapshot::Snapshot;
use super::types::{Record, Value};
use crate::error::Result;
use smallvec::SmallVec;
use tracing::trace;

/// Join every row of `table` against the targets named by `relations`.
///
/// Each output row starts as a copy of the source row. Relations apply in order;
/// a relation whose source field is absent from a row is skipped for that row.
///
/// When the source field is present the output field is always written: a `One`
/// relation without a match writes `null` and a `Many` relation an empty array. The
/// presence of the output field therefore does not mean a match was found.
///
/// Scans are linear: cost is |table| x |target| per relation.
pub fn materialize(snapshot: &Snapshot, table: &str, relations: &[Relation]) -> Result<Vec<Record>> {
    let rows = snapshot.rows(table)?;
    let targets: SmallVec<[&[Record]; 4]> = relations
        .iter()
        .map(|relation| snapshot.rows(&relation.target_table))
        .collect::<Result<_>>()?;

    for relation in relations {
        trace!(
            table,
            source = %relation.source_field,
            target = %relation.target_table,
            field = %relation.target_field,
            output = %relation.output_field,
            cardinality = ?relation.cardinality,
            "joining"
        );
    }

    let output = rows
        .iter()
        .map(|row| {
            let mut out = row.clone();
            for (relation, target_rows) in relations.iter().zip(targets.iter()) {
                let Some(key) = row.get(&relation.source_field) else {
                    continue;
                };
                out.set(relation.output_field.clone(), join(relation, key, target_rows));
            }
            out
        })
        .collect();

    Ok(output)
}

fn join(relation: &Relation, key: &Value, target_rows: &[Record]) -> Value {
    let field = relation.target_field.as_str();
    match relation.cardinality {
        Cardinality::One => target_rows
            .iter()
            .find(|target| target.field_eq(field, key))
            .map(|target| target.clone().into_value())
            .unwrap_or(Value::Null),
        Cardinality::Many => Value::Array(
            target_rows
                .iter()
                .filter(|target| target.field_eq(field, key))
                .map(|target| target.clone().into_value())
                .collect(),
        ),
    }
}
