//! Offline artifact build: chunks + embeddings -> one LanceDB table.
//!
//! Rows are written in chunk-id order. A table is never overwritten; the
//! serving side treats it as read-only.
use anyhow::{bail, Result};
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::sync::Arc;
use tracing::info;

use tutor_core::traits::Embedder;
use tutor_core::types::Chunk;

use crate::schema::build_arrow_schema;
use crate::table::{meta_key, open_db, set_meta, table_exists};

const BATCH_SIZE: usize = 256;

pub struct ArtifactWriter {
	db: Connection,
	table_name: String,
}

impl ArtifactWriter {
	pub async fn new(uri: &str, table_name: &str) -> Result<Self> {
		let db = open_db(uri).await?;
		Ok(Self { db, table_name: table_name.to_string() })
	}

	/// Embed every chunk with `embedder` and persist rows plus build metadata.
	pub async fn write(&self, chunks: &[Chunk], embedder: &dyn Embedder) -> Result<usize> {
		if table_exists(&self.db, &self.table_name).await? {
			bail!("artifact table '{}' already exists; remove it before rebuilding", self.table_name);
		}
		for (pos, chunk) in chunks.iter().enumerate() {
			if chunk.id != pos { bail!("chunk at position {} carries id {}", pos, chunk.id); }
		}
		let dim = embedder.dim();
		info!(chunks = chunks.len(), table = %self.table_name, embedder_id = embedder.embedder_id(), "writing corpus artifact");
		let pb = ProgressBar::new(chunks.len() as u64);
		pb.set_style(
			ProgressStyle::default_bar()
				.template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
				.progress_chars("#>-"),
		);
		let mut written = 0usize;
		for batch in chunks.chunks(BATCH_SIZE) {
			let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
			let vectors = embedder.embed_batch(&texts)?;
			if vectors.len() != batch.len() { bail!("embedder returned {} vectors for {} texts", vectors.len(), batch.len()); }
			if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
				bail!("dim mismatch: got {} expected {}", bad.len(), dim);
			}
			self.insert_batch(batch, vectors, dim).await?;
			written += batch.len();
			pb.set_position(written as u64);
		}
		if chunks.is_empty() {
			// An empty corpus still gets a table so the loader sees a valid, empty artifact.
			let reader = RecordBatchIterator::new(vec![].into_iter(), build_arrow_schema(dim as i32));
			self.db.create_table(&self.table_name, Box::new(reader)).execute().await?;
		}
		pb.finish_with_message("artifact written");

		set_meta(&self.db, &meta_key(&self.table_name, "embedder_id"), embedder.embedder_id()).await?;
		set_meta(&self.db, &meta_key(&self.table_name, "dim"), &dim.to_string()).await?;
		set_meta(&self.db, &meta_key(&self.table_name, "chunk_count"), &written.to_string()).await?;
		set_meta(&self.db, &meta_key(&self.table_name, "built_at"), &Utc::now().to_rfc3339()).await?;
		info!(written, "corpus artifact complete");
		Ok(written)
	}

	async fn insert_batch(&self, chunks: &[Chunk], vectors: Vec<Vec<f32>>, dim: usize) -> Result<()> {
		let record_batch = Self::to_record_batch(chunks, vectors, dim)?;
		let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		if table_exists(&self.db, &self.table_name).await? {
			self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
		} else {
			self.db.create_table(&self.table_name, reader).execute().await?;
		}
		Ok(())
	}

	fn to_record_batch(chunks: &[Chunk], vectors: Vec<Vec<f32>>, dim: usize) -> Result<RecordBatch> {
		let ids: Vec<i32> = chunks.iter().map(|c| i32::try_from(c.id)).collect::<Result<_, _>>()?;
		let doc_ids: Vec<String> = chunks.iter().map(|c| c.doc_id.clone()).collect();
		let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
		let vectors = vectors.into_iter().map(|v| Some(v.into_iter().map(Some).collect::<Vec<_>>()));
		let record_batch = RecordBatch::try_new(build_arrow_schema(dim as i32), vec![
			Arc::new(Int32Array::from(ids)),
			Arc::new(StringArray::from(doc_ids)),
			Arc::new(StringArray::from(contents)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, dim as i32)),
		])?;
		Ok(record_batch)
	}
}
