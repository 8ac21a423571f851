//! Offline corpus chunker: `.txt` course notes -> ordered `DocumentChunk`s.
//!
//! Paragraphs (blank-line separated) become chunks; paragraphs longer than the
//! token budget are split into overlapping word windows. File order is sorted
//! so the resulting chunk ids are reproducible.
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{Chunk, DocumentChunk};

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub window_words: usize,
    pub overlap_percent: f32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_tokens: 500, window_words: 300, overlap_percent: 0.2 }
    }
}

#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(chunking_config: ChunkingConfig) -> Self { Self { chunking_config } }

    /// Chunk every `.txt` file under `data_dir`, optionally stopping after `limit` files.
    pub fn process_directory(&self, data_dir: &Path, limit: Option<usize>) -> Result<Vec<DocumentChunk>> {
        let mut files = self.list_txt_files(data_dir);
        if files.is_empty() {
            info!(dir = %data_dir.display(), "no .txt files found");
            return Ok(vec![]);
        }
        if let Some(limit) = limit {
            if files.len() > limit {
                files.truncate(limit);
                info!(limit, "limited to first files");
            }
        }
        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            debug!(file = %file_path.display(), n = file_index + 1, of = files.len(), "processing file");
            let content = self.read_file_content(file_path)?;
            let doc_id = Self::extract_doc_id(file_path);
            all_chunks.extend(self.chunk_content(&content, &doc_id, file_path));
        }
        info!(files = files.len(), chunks = all_chunks.len(), "processed corpus directory");
        Ok(all_chunks)
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn extract_doc_id(file_path: &Path) -> String {
        file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string_lossy().to_string())
    }

    fn chunk_content(&self, content: &str, doc_id: &str, file_path: &Path) -> Vec<DocumentChunk> {
        let doc_path = file_path.to_string_lossy().to_string();
        let mut pieces = Vec::new();
        for paragraph in content.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() { continue; }
            if self.count_tokens(paragraph) <= self.chunking_config.max_tokens {
                pieces.push(paragraph.to_string());
            } else {
                pieces.extend(self.split_paragraph_with_overlap(paragraph));
            }
        }
        let total_chunks = pieces.len();
        pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| DocumentChunk {
                doc_id: doc_id.to_string(),
                doc_path: doc_path.clone(),
                content,
                chunk_index,
                total_chunks,
            })
            .collect()
    }

    fn count_tokens(&self, text: &str) -> usize {
        let word_count = text.split_whitespace().count();
        (word_count as f32 / 0.75) as usize
    }

    fn split_paragraph_with_overlap(&self, paragraph: &str) -> Vec<String> {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        let window = self.chunking_config.window_words.max(1);
        let overlap = ((window as f32 * self.chunking_config.overlap_percent) as usize).min(window - 1);
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + window).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end >= words.len() { break; }
            start = end - overlap;
        }
        chunks
    }

    fn list_txt_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
            .map(|e| e.path().to_path_buf())
            .collect();
        txt_files.sort();
        txt_files
    }
}

/// Assign corpus ids in order: the n-th document chunk becomes `Chunk { id: n }`.
pub fn assign_ids(chunks: Vec<DocumentChunk>) -> Vec<Chunk> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(id, c)| Chunk { id, doc_id: c.doc_id, content: c.content })
        .collect()
}
