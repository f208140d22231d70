//! Curriculum document ingestion
//!
//! Reads a curriculum document, splits it into overlapping chunks,
//! standardizes document metadata (canonical subject, standard grade
//! form), assigns each chunk its specific grade level, embeds the chunks
//! and upserts them into the vector index. Chunk identity is derived from
//! content, so re-ingesting the same document overwrites the same points
//! instead of duplicating them.

use crate::config::{ChunkConfig, CountryPatterns};
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::grade::{determine_chunk_grade, standardize_grade_level, GradeTopics};
use crate::index::{ChunkPoint, CurriculumChunk, VectorIndex};
use crate::subject::SubjectMapper;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Document-level metadata supplied with an ingestion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub subject: String,
    pub grade_level: String,
    #[serde(default = "default_document_type")]
    pub document_type: String,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Optional grade-specific topic tables used to pin chunks to a grade
    #[serde(default)]
    pub grade_topics: Vec<GradeTopics>,
}

fn default_document_type() -> String {
    "curriculum".to_string()
}

/// Result of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    pub source: String,
    pub subject: String,
    pub grade_level: String,
    pub chunks: usize,
}

/// Read a document's text from disk. Markdown and plain text are read
/// directly; PDFs require the `pdf` feature.
pub fn read_document(path: &Path) -> Result<String> {
    let is_pdf = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if is_pdf {
        #[cfg(feature = "pdf")]
        {
            return pdf_extract::extract_text(path)
                .map_err(|e| Error::Ingest(format!("Failed to extract PDF text: {}", e)));
        }

        #[cfg(not(feature = "pdf"))]
        {
            return Err(Error::Ingest(
                "PDF support not enabled. Rebuild with the 'pdf' feature.".to_string(),
            ));
        }
    }

    Ok(std::fs::read_to_string(path)?)
}

/// Split text into overlapping chunks on character boundaries
pub fn split_into_chunks(text: &str, config: &ChunkConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let max = config.max_chars.max(1);
    let overlap = config.overlap_chars.min(max - 1);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + max).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim().to_string();

        // Skip fragments below the minimum, except a final remainder
        if !chunk.is_empty() && (chunk.chars().count() >= config.min_chars || end == chars.len()) {
            chunks.push(chunk);
        }

        if end == chars.len() {
            break;
        }
        start = end - overlap;
    }

    chunks
}

/// Chunk, embed and upsert one curriculum document.
///
/// `on_progress` is called once per embedded chunk so callers can drive a
/// progress bar.
pub async fn ingest_document(
    text: &str,
    source: &str,
    meta: &DocumentMetadata,
    country: &str,
    patterns: &CountryPatterns,
    subjects: &SubjectMapper,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    chunk_config: &ChunkConfig,
    batch_size: usize,
    mut on_progress: impl FnMut(usize),
) -> Result<IngestStats> {
    let subject = subjects.normalize(&meta.subject);
    let default_grade = standardize_grade_level(&meta.grade_level, patterns);
    let country = country.to_lowercase();

    info!(
        "Ingesting '{}' as subject '{}', grade '{}', country '{}'",
        source, subject, default_grade, country
    );

    let chunks = split_into_chunks(text, chunk_config);
    if chunks.is_empty() {
        return Err(Error::Ingest(format!(
            "Document '{}' produced no chunks",
            source
        )));
    }
    debug!("Split '{}' into {} chunks", source, chunks.len());

    let mut processed = 0usize;

    for batch in chunks.chunks(batch_size.max(1)) {
        let vectors = embedder.embed(batch.to_vec()).await?;
        if vectors.len() != batch.len() {
            return Err(Error::Embedding(format!(
                "Embedder returned {} vectors for {} chunks",
                vectors.len(),
                batch.len()
            )));
        }

        let mut points = Vec::with_capacity(batch.len());
        for (offset, (chunk_text, vector)) in batch.iter().zip(vectors).enumerate() {
            let chunk_index = (processed + offset) as i64;
            let grade_level = determine_chunk_grade(
                chunk_text,
                &meta.grade_topics,
                &default_grade,
                patterns,
            );

            let payload = CurriculumChunk {
                content: chunk_text.clone(),
                subject: subject.clone(),
                grade_level,
                country: country.clone(),
                source: source.to_string(),
                page: 0,
                document_type: meta.document_type.clone(),
                chunk_index,
                topics: meta.topics.clone(),
            };

            let content_hash = blake3::hash(chunk_text.as_bytes()).to_hex().to_string();
            points.push(ChunkPoint::new(&content_hash, vector, payload));
        }

        index.upsert(points).await?;
        processed += batch.len();
        on_progress(processed);
    }

    info!("Ingested {} chunks from '{}'", processed, source);

    Ok(IngestStats {
        source: source.to_string(),
        subject,
        grade_level: default_grade,
        chunks: processed,
    })
}
