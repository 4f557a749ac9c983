#![forbid(unsafe_code)]

use ns_core::ids::NodeId;
use ns_core::{Bounds, Node};
use rusqlite::Row;
use rusqlite::types::Type;

pub(in crate::store) const NODE_COLUMNS: &str =
    "id, name, parent_id, lft, rgt";

pub(in crate::store) fn node_id_column(row: &Row<'_>, index: usize) -> rusqlite::Result<NodeId> {
    let raw = row.get::<_, i64>(index)?;
    NodeId::try_new(raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(err)))
}

fn optional_node_id_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<NodeId>> {
    match row.get::<_, Option<i64>>(index)? {
        Some(raw) => NodeId::try_new(raw).map(Some).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(err))
        }),
        None => Ok(None),
    }
}

/// Maps a row selected with [`NODE_COLUMNS`].
pub(in crate::store) fn node_from_row(row: &Row<'_>) -> rusqlite::Result<Node> {
    Ok(Node {
        id: node_id_column(row, 0)?,
        name: row.get(1)?,
        parent_id: optional_node_id_column(row, 2)?,
        bounds: Bounds::new(row.get(3)?, row.get(4)?),
    })
}
