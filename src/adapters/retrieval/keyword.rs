//! Full-text index over local guideline files
//!
//! Files ending in `.txt` or `.md` are split into paragraph-aligned chunks of
//! roughly `chunk_size` characters and indexed in an in-memory tantivy index,
//! one document per chunk. Queries are parsed leniently, since they come from
//! the extraction service and may contain query-syntax characters, and ranked
//! with BM25. Chunks sharing no term with the query are never returned.

use super::traits::{GuidelineDocument, GuidelineRetriever};
use crate::domain::{CasewiseError, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, TantivyDocument};

const WRITER_MEMORY_BYTES: usize = 20_000_000;

fn index_error(e: impl std::fmt::Display) -> CasewiseError {
    CasewiseError::Retrieval(format!("Guideline index error: {e}"))
}

/// In-memory full-text index
pub struct KeywordIndex {
    index: Index,
    reader: IndexReader,
    id_field: Field,
    text_field: Field,
    chunks: usize,
    top_k: usize,
}

impl KeywordIndex {
    /// Builds an index from `(source name, text)` pairs
    pub fn from_texts<I, S, T>(texts: I, chunk_size: usize, top_k: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut schema_builder = Schema::builder();
        let id_field = schema_builder.add_text_field("id", STRING | STORED);
        let text_field = schema_builder.add_text_field("text", TEXT | STORED);
        let index = Index::create_in_ram(schema_builder.build());

        let mut writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_MEMORY_BYTES)
            .map_err(index_error)?;

        let mut chunks = 0;
        for (source, text) in texts {
            for (position, chunk) in chunk_text(text.as_ref(), chunk_size).into_iter().enumerate() {
                let id = chunk_id(source.as_ref(), position, &chunk);
                writer
                    .add_document(doc!(id_field => id, text_field => chunk))
                    .map_err(index_error)?;
                chunks += 1;
            }
        }
        writer.commit().map_err(index_error)?;

        let reader = index.reader().map_err(index_error)?;

        Ok(Self {
            index,
            reader,
            id_field,
            text_field,
            chunks,
            top_k: top_k.max(1),
        })
    }

    /// Indexes every `.txt` / `.md` file directly inside `dir`
    ///
    /// Files are read in name order so chunk identifiers are stable.
    pub fn from_dir(dir: impl AsRef<Path>, chunk_size: usize, top_k: usize) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            CasewiseError::Retrieval(format!(
                "Cannot read guidelines directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && matches!(
                        path.extension().and_then(|ext| ext.to_str()),
                        Some("txt") | Some("md")
                    )
            })
            .collect();
        paths.sort();

        let mut texts = Vec::with_capacity(paths.len());
        for path in &paths {
            let text = std::fs::read_to_string(path)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            texts.push((name, text));
        }

        let index = Self::from_texts(texts, chunk_size, top_k)?;
        if index.is_empty() {
            tracing::warn!(dir = %dir.display(), "Guideline index is empty");
        } else {
            tracing::info!(
                dir = %dir.display(),
                files = paths.len(),
                chunks = index.len(),
                "Guideline index built"
            );
        }

        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.chunks
    }

    pub fn is_empty(&self) -> bool {
        self.chunks == 0
    }

    /// Ranks chunks for `query`, best first, at most `top_k`
    pub fn search(&self, query: &str) -> Result<Vec<GuidelineDocument>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let parser = QueryParser::for_index(&self.index, vec![self.text_field]);
        let (parsed, errors) = parser.parse_query_lenient(query);
        if !errors.is_empty() {
            tracing::debug!(query = %query, errors = errors.len(), "Query parsed leniently");
        }

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&parsed, &TopDocs::with_limit(self.top_k))
            .map_err(index_error)?;

        let mut documents = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let retrieved: TantivyDocument = searcher.doc(address).map_err(index_error)?;
            let field_text = |field: Field| {
                retrieved
                    .get_first(field)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string()
            };
            documents.push(GuidelineDocument::new(
                field_text(self.id_field),
                field_text(self.text_field),
            ));
        }

        Ok(documents)
    }
}

#[async_trait]
impl GuidelineRetriever for KeywordIndex {
    async fn retrieve(&self, query: &str) -> Result<Vec<GuidelineDocument>> {
        self.search(query)
    }
}

/// Splits on blank lines and packs paragraphs into chunks of about `chunk_size` characters
fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        if !current.is_empty() && current.len() + paragraph.len() + 2 > chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn chunk_id(source: &str, position: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(position.to_le_bytes());
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("{source}#{position}-{hex}")
}
