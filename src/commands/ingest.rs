//! Ingest command implementation

use crate::config::Config;
use crate::embed::Embedder;
use crate::error::Result;
use crate::grade::GradeTopics;
use crate::index::VectorIndex;
use crate::ingest::{ingest_document, read_document, DocumentMetadata, IngestStats};
use crate::progress::ingest_bar;
use crate::subject::SubjectMapper;
use std::path::PathBuf;

/// Ingest options from the CLI
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub file: PathBuf,
    pub subject: String,
    pub grade_level: String,
    pub document_type: String,
    pub topics: Vec<String>,
    pub country: Option<String>,
}

/// Ingest one curriculum document into the vector index
pub async fn cmd_ingest(
    config: &Config,
    index: &dyn VectorIndex,
    embedder: &dyn Embedder,
    options: IngestOptions,
) -> Result<IngestStats> {
    let text = read_document(&options.file)?;
    let source = options
        .file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| options.file.display().to_string());

    let country = options.country.as_deref().unwrap_or(&config.country);
    let patterns = config.country_patterns(country);
    let subjects = SubjectMapper::new(&config.subjects);

    let meta = DocumentMetadata {
        subject: options.subject,
        grade_level: options.grade_level,
        document_type: options.document_type,
        topics: options.topics,
        grade_topics: Vec::<GradeTopics>::new(),
    };

    // Rough chunk estimate for the bar; the callback reports exact counts
    let stride = config.chunk.max_chars.saturating_sub(config.chunk.overlap_chars).max(1);
    let estimated = (text.chars().count() / stride + 1) as u64;
    let bar = ingest_bar(estimated);
    bar.set_message(source.clone());

    let stats = ingest_document(
        &text,
        &source,
        &meta,
        country,
        &patterns,
        &subjects,
        embedder,
        index,
        &config.chunk,
        config.embedding.batch_size,
        |processed| bar.set_position(processed as u64),
    )
    .await?;

    bar.finish_and_clear();
    Ok(stats)
}

/// Print ingest stats to console
pub fn print_ingest_stats(stats: &IngestStats) {
    println!("Ingested {}:", stats.source);
    println!("  Subject:     {}", stats.subject);
    println!("  Grade level: {}", stats.grade_level);
    println!("  Chunks:      {}", stats.chunks);
}
