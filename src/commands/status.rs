//! Status command implementation

use crate::config::Config;
use crate::db::{ContentDb, StoreCounts};
use crate::error::Result;
use crate::index::{QdrantIndex, VectorIndex};
use serde::Serialize;
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub qdrant_url: String,
    pub collection_name: String,
    pub embedding_model: String,
    pub country: String,
    pub qdrant_connected: bool,
    pub collection_exists: bool,
    pub indexed_vectors: u64,
    pub store_counts: StoreCounts,
}

/// Get system status
pub async fn cmd_status(config: &Config, db: &ContentDb, index: &QdrantIndex) -> Result<StatusInfo> {
    info!("Getting status");

    let store_counts = db.counts().await?;

    let (qdrant_connected, collection_exists, indexed_vectors) =
        match index.collection_exists().await {
            Ok(true) => match index.total_vectors().await {
                Ok(count) => (true, true, count),
                Err(e) => {
                    tracing::debug!("Qdrant stats error: {:?}", e);
                    (true, true, 0)
                }
            },
            Ok(false) => (true, false, 0),
            Err(e) => {
                tracing::debug!("Qdrant connection error: {:?}", e);
                (false, false, 0)
            }
        };

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        qdrant_url: config.qdrant_url.clone(),
        collection_name: config.collection_name.clone(),
        embedding_model: config.embedding.model.clone(),
        country: config.country.clone(),
        qdrant_connected,
        collection_exists,
        indexed_vectors,
        store_counts,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("currigen status\n");
    println!("Config:      {}", status.config_path);
    println!("Database:    {}", status.db_path);
    println!("Qdrant:      {}", status.qdrant_url);
    println!("Collection:  {}", status.collection_name);
    println!("Model:       {}", status.embedding_model);
    println!("Country:     {}", status.country);
    println!();

    if !status.qdrant_connected {
        println!("Qdrant:      UNREACHABLE");
    } else if !status.collection_exists {
        println!("Qdrant:      connected (collection missing - run ingest)");
    } else {
        println!("Vectors:     {}", status.indexed_vectors);
    }

    println!();
    println!("Contexts:     {}", status.store_counts.contexts);
    println!("Schemes:      {}", status.store_counts.schemes);
    println!("Lesson plans: {}", status.store_counts.lesson_plans);
    println!("Lesson notes: {}", status.store_counts.lesson_notes);
    println!("Exams:        {}", status.store_counts.exams);
}
