//! Retrieve command implementation

use crate::error::Result;
use crate::retrieval::{Query, RetrievalEngine, RetrievalResult, RetrievalStatus};
use tracing::info;

/// Retrieve options from the CLI
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    pub country: Option<String>,
    pub top_k: Option<usize>,
}

/// Run a retrieval and return the structured result
pub async fn cmd_retrieve(
    engine: &RetrievalEngine,
    options: RetrieveOptions,
) -> Result<RetrievalResult> {
    let query = Query {
        subject: options.subject,
        grade_level: options.grade_level,
        topic: options.topic,
        country: options.country,
    };
    let top_k = options.top_k.unwrap_or_else(|| engine.default_top_k());

    let result = engine.retrieve(&query, top_k).await;
    info!("Retrieval status: {:?}", result.status);
    Ok(result)
}

/// Print a retrieval result to console
pub fn print_retrieval_result(result: &RetrievalResult) {
    match result.status {
        RetrievalStatus::Valid => {
            println!("Found {} matching chunks:\n", result.matches.len());
            for (i, m) in result.matches.iter().enumerate() {
                println!(
                    "{}. [score: {:.3}, topic relevance: {}] {} ({}, page {})",
                    i + 1,
                    m.score,
                    m.topic_relevance,
                    m.chunk.grade_level,
                    m.chunk.source,
                    m.chunk.page
                );

                let preview: String = m.chunk.content.chars().take(200).collect();
                println!("   {}\n", preview.replace('\n', " "));
            }
            println!("Context length: {} characters", result.context.len());
        }
        RetrievalStatus::Invalid => {
            println!(
                "No relevant curriculum data found: {}",
                result.message.as_deref().unwrap_or("no match")
            );
        }
        RetrievalStatus::Error => {
            println!(
                "Retrieval error: {}",
                result.message.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
