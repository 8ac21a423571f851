//! Read-only load of a corpus artifact into memory.
//!
//! Rows are ordered by chunk id and checked against the invariants the
//! serving side relies on: ids are exactly `0..n`, every vector has the
//! recorded dimension, and the artifact was embedded by the same embedder
//! that will embed live questions.
use anyhow::{anyhow, Result};
use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray, Int32Array, StringArray};
use lancedb::query::ExecutableQuery;
use tracing::info;

use tutor_core::types::Chunk;
use tutor_core::Error;

use crate::flat::FlatIpIndex;
use crate::table::{get_meta, meta_key, open_db, table_exists};

pub struct LoadedArtifacts {
    pub chunks: Vec<Chunk>,
    pub index: FlatIpIndex,
}

fn column<'a, T: 'static>(batch: &'a arrow_array::RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| anyhow!("artifact column '{}' missing or mistyped", name))
}

/// Load `table` from the LanceDB at `uri`, requiring it was built by `expected_embedder_id`.
pub async fn load_artifacts(uri: &str, table: &str, expected_embedder_id: &str) -> Result<LoadedArtifacts> {
    let conn = open_db(uri).await?;
    if !table_exists(&conn, table).await? {
        return Err(Error::NotFound(format!("artifact table '{table}' in {uri}")).into());
    }
    let embedder_id = get_meta(&conn, &meta_key(table, "embedder_id"))
        .await?
        .ok_or_else(|| Error::InvalidArtifact(format!("table '{table}' has no embedder_id metadata")))?;
    if embedder_id != expected_embedder_id {
        return Err(Error::InvalidArtifact(format!(
            "table '{table}' was embedded with '{embedder_id}' but the serving embedder is '{expected_embedder_id}'"
        ))
        .into());
    }
    let dim: usize = get_meta(&conn, &meta_key(table, "dim"))
        .await?
        .ok_or_else(|| Error::InvalidArtifact(format!("table '{table}' has no dim metadata")))?
        .parse()?;

    let t = conn.open_table(table).execute().await?;
    let mut rows: Vec<(usize, String, String, Vec<f32>)> = Vec::new();
    let mut stream = t.query().execute().await?;
    while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
        let id_col = column::<Int32Array>(&batch, "id")?;
        let doc_col = column::<StringArray>(&batch, "doc_id")?;
        let content_col = column::<StringArray>(&batch, "content")?;
        let vec_col = column::<FixedSizeListArray>(&batch, "vector")?;
        for i in 0..batch.num_rows() {
            let id = usize::try_from(id_col.value(i))
                .map_err(|_| Error::InvalidArtifact(format!("negative chunk id {}", id_col.value(i))))?;
            if !vec_col.is_valid(i) {
                return Err(Error::InvalidArtifact(format!("chunk {id} has no vector")).into());
            }
            let vector = vec_col
                .value(i)
                .as_primitive::<arrow_array::types::Float32Type>()
                .values()
                .to_vec();
            rows.push((id, doc_col.value(i).to_string(), content_col.value(i).to_string(), vector));
        }
    }
    rows.sort_by_key(|(id, ..)| *id);

    let mut chunks = Vec::with_capacity(rows.len());
    let mut vectors = Vec::with_capacity(rows.len());
    for (pos, (id, doc_id, content, vector)) in rows.into_iter().enumerate() {
        if id != pos {
            return Err(Error::InvalidArtifact(format!("chunk ids are not contiguous: expected {pos}, found {id}")).into());
        }
        chunks.push(Chunk { id, doc_id, content });
        vectors.push(vector);
    }
    let index = FlatIpIndex::from_rows(dim, vectors).map_err(|e| Error::InvalidArtifact(e.to_string()))?;
    info!(table, chunks = chunks.len(), dim, embedder_id = %embedder_id, "loaded corpus artifact");
    Ok(LoadedArtifacts { chunks, index })
}
