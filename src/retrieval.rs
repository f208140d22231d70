//! Curriculum retrieval engine
//!
//! Combines vector similarity with categorical filters and topic-keyword
//! re-ranking:
//! 1. Empty-index gate (distinct from "no match for this query")
//! 2. Query field validation, before any network call
//! 3. Subject normalization
//! 4. Embedding of "{subject} {grade_level} {topic}"
//! 5. Filtered similarity search over a generous candidate pool
//! 6. Grade-compatibility filter (strict: failures are discarded)
//! 7. Topic-relevance scoring and re-ranking
//! 8. Context assembly
//!
//! Every failure mode resolves to a structured `RetrievalResult`; no
//! error escapes `retrieve` as an `Err`.

use crate::config::RetrievalConfig;
use crate::embed::Embedder;
use crate::grade::grade_matches;
use crate::index::{CurriculumChunk, IndexFilter, VectorIndex};
use crate::subject::SubjectMapper;
use serde::Serialize;
use tracing::{debug, info, warn};

/// An ephemeral retrieval request
#[derive(Debug, Clone)]
pub struct Query {
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    /// Country override; the engine's configured country applies if unset
    pub country: Option<String>,
}

/// Outcome class of a retrieval call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalStatus {
    /// Context assembled from at least one surviving candidate
    Valid,
    /// Well-formed query, non-empty index, but nothing survived filtering
    Invalid,
    /// Empty index, malformed query, or upstream failure
    Error,
}

/// A surviving candidate, in final rank order
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalMatch {
    pub id: String,
    pub score: f32,
    pub topic_relevance: u32,
    pub chunk: CurriculumChunk,
}

/// Structured result of a retrieval call
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub status: RetrievalStatus,
    /// Concatenated content of the surviving candidates
    pub context: String,
    pub matches: Vec<RetrievalMatch>,
    /// Human-readable explanation for Invalid/Error outcomes
    pub message: Option<String>,
    /// Suggestion hook; currently always empty
    pub alternatives: Vec<String>,
}

impl RetrievalResult {
    fn error(message: impl Into<String>) -> Self {
        Self {
            status: RetrievalStatus::Error,
            context: String::new(),
            matches: Vec::new(),
            message: Some(message.into()),
            alternatives: Vec::new(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            status: RetrievalStatus::Invalid,
            context: String::new(),
            matches: Vec::new(),
            message: Some(message.into()),
            alternatives: Vec::new(),
        }
    }

    fn valid(context: String, matches: Vec<RetrievalMatch>) -> Self {
        Self {
            status: RetrievalStatus::Valid,
            context,
            matches,
            message: None,
            alternatives: Vec::new(),
        }
    }
}

/// Retrieval engine owning its index and embedder backends
pub struct RetrievalEngine {
    index: Box<dyn VectorIndex>,
    embedder: Box<dyn Embedder>,
    subjects: SubjectMapper,
    country: String,
    pool_size: usize,
    top_k: usize,
}

impl RetrievalEngine {
    pub fn new(
        index: Box<dyn VectorIndex>,
        embedder: Box<dyn Embedder>,
        subjects: SubjectMapper,
        country: String,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            subjects,
            country,
            pool_size: config.pool_size,
            top_k: config.top_k,
        }
    }

    /// The configured default result count
    pub fn default_top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve curriculum context for a query.
    ///
    /// Total from the caller's point of view: upstream failures are folded
    /// into a `RetrievalStatus::Error` result.
    pub async fn retrieve(&self, query: &Query, top_k: usize) -> RetrievalResult {
        // Empty-index gate, before anything else: "nothing ingested" must
        // surface differently from "no match for this query"
        let total = match self.index.total_vectors().await {
            Ok(t) => t,
            Err(e) => return RetrievalResult::error(format!("Error checking index: {}", e)),
        };
        debug!("Index holds {} vectors", total);

        if total == 0 {
            return RetrievalResult::error(
                "Index is empty. Ingest a curriculum document first.",
            );
        }

        if query.subject.trim().is_empty()
            || query.grade_level.trim().is_empty()
            || query.topic.trim().is_empty()
        {
            return RetrievalResult::error(
                "Query must include non-empty subject, grade_level and topic",
            );
        }

        let subject = self.subjects.normalize(&query.subject);
        let country = query
            .country
            .as_deref()
            .unwrap_or(&self.country)
            .to_lowercase();

        info!(
            "Retrieving: subject='{}', grade='{}', topic='{}', country='{}'",
            subject, query.grade_level, query.topic, country
        );

        let query_text = format!("{} {} {}", subject, query.grade_level, query.topic);
        let query_vector = match self.embedder.embed(vec![query_text]).await {
            Ok(mut vectors) if !vectors.is_empty() => vectors.swap_remove(0),
            Ok(_) => return RetrievalResult::error("Embedder returned no vector"),
            Err(e) => return RetrievalResult::error(format!("Embedding failed: {}", e)),
        };

        let filter = IndexFilter {
            country,
            subject: subject.clone(),
        };
        let candidates = match self.index.query(query_vector, self.pool_size, &filter).await {
            Ok(matches) => matches,
            Err(e) => return RetrievalResult::error(format!("Error querying index: {}", e)),
        };
        debug!("Found {} candidates for subject '{}'", candidates.len(), subject);

        // Grade filter: candidates that don't cover the queried grade are
        // discarded entirely, even if that empties the pool
        let graded: Vec<_> = candidates
            .into_iter()
            .filter(|m| grade_matches(&query.grade_level, &m.chunk.grade_level))
            .collect();
        debug!("{} candidates after grade filtering", graded.len());

        // Topic relevance: curated topic tags weigh double free-text hits
        let keywords: Vec<String> = query
            .topic
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let mut scored: Vec<RetrievalMatch> = graded
            .into_iter()
            .filter_map(|m| {
                let relevance = topic_relevance(&keywords, &m.chunk);
                if relevance == 0 {
                    return None;
                }
                Some(RetrievalMatch {
                    id: m.id,
                    score: m.score,
                    topic_relevance: relevance,
                    chunk: m.chunk,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.topic_relevance
                .cmp(&a.topic_relevance)
                .then(b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal))
        });
        scored.truncate(top_k);

        debug!("{} matches after topic filtering", scored.len());

        if scored.is_empty() {
            warn!("No relevant curriculum data for topic '{}'", query.topic);
            return RetrievalResult::invalid("No relevant data found.");
        }

        let context = scored
            .iter()
            .map(|m| m.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        RetrievalResult::valid(context, scored)
    }
}

/// Count topic-keyword hits for one chunk: +1 per keyword found in the
/// content, +2 per keyword found in a curated topic tag
fn topic_relevance(keywords: &[String], chunk: &CurriculumChunk) -> u32 {
    let content = chunk.content.to_lowercase();
    let mut relevance = 0;

    for keyword in keywords {
        if content.contains(keyword.as_str()) {
            relevance += 1;
        }
        for topic in &chunk.topics {
            if topic.to_lowercase().contains(keyword.as_str()) {
                relevance += 2;
            }
        }
    }

    relevance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubjectMappings;
    use crate::error::{Error, Result};
    use crate::index::IndexMatch;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory index: brute-force cosine similarity over stored points
    struct MemoryIndex {
        points: Mutex<Vec<(String, Vec<f32>, CurriculumChunk)>>,
        fail_stats: bool,
    }

    impl MemoryIndex {
        fn new() -> Self {
            Self {
                points: Mutex::new(Vec::new()),
                fail_stats: false,
            }
        }

        fn with_chunk(chunk: CurriculumChunk, vector: Vec<f32>) -> Self {
            let index = Self::new();
            index
                .points
                .lock()
                .unwrap()
                .push(("chunk-0".to_string(), vector, chunk));
            index
        }
    }

    #[async_trait]
    impl VectorIndex for MemoryIndex {
        async fn total_vectors(&self) -> Result<u64> {
            if self.fail_stats {
                return Err(Error::Qdrant("connection refused".to_string()));
            }
            Ok(self.points.lock().unwrap().len() as u64)
        }

        async fn query(
            &self,
            vector: Vec<f32>,
            top_k: usize,
            filter: &IndexFilter,
        ) -> Result<Vec<IndexMatch>> {
            let mut matches: Vec<IndexMatch> = self
                .points
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, _, c)| c.country == filter.country && c.subject == filter.subject)
                .map(|(id, v, c)| IndexMatch {
                    id: id.clone(),
                    score: cosine(&vector, v),
                    chunk: c.clone(),
                })
                .collect();
            matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
            matches.truncate(top_k);
            Ok(matches)
        }

        async fn upsert(&self, points: Vec<crate::index::ChunkPoint>) -> Result<()> {
            let mut stored = self.points.lock().unwrap();
            for p in points {
                stored.push((p.id.to_string(), p.vector, p.payload));
            }
            Ok(())
        }
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if na == 0.0 || nb == 0.0 {
            0.0
        } else {
            dot / (na * nb)
        }
    }

    /// Deterministic stub embedder: counts character codes into buckets
    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .into_iter()
                .map(|t| {
                    let mut v = vec![0.0f32; 8];
                    for (i, b) in t.bytes().enumerate() {
                        v[i % 8] += b as f32 / 255.0;
                    }
                    v
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            8
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Err(Error::Embedding("model not loaded".to_string()))
        }

        fn dimension(&self) -> usize {
            8
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn maths_chunk() -> CurriculumChunk {
        CurriculumChunk {
            content: "Pupils identify fractions of whole numbers using concrete objects"
                .to_string(),
            subject: "mathematics".to_string(),
            grade_level: "primary 4".to_string(),
            country: "nigeria".to_string(),
            source: "maths_curriculum.pdf".to_string(),
            page: 3,
            document_type: "curriculum".to_string(),
            chunk_index: 0,
            topics: vec!["fractions".to_string()],
        }
    }

    fn engine_with(index: Box<dyn VectorIndex>, embedder: Box<dyn Embedder>) -> RetrievalEngine {
        RetrievalEngine::new(
            index,
            embedder,
            SubjectMapper::new(&SubjectMappings::default()),
            "nigeria".to_string(),
            &RetrievalConfig {
                top_k: 10,
                pool_size: 30,
            },
        )
    }

    fn query(subject: &str, grade: &str, topic: &str) -> Query {
        Query {
            subject: subject.to_string(),
            grade_level: grade.to_string(),
            topic: topic.to_string(),
            country: None,
        }
    }

    #[tokio::test]
    async fn test_empty_index_is_error() {
        let engine = engine_with(Box::new(MemoryIndex::new()), Box::new(StubEmbedder));
        let result = engine
            .retrieve(&query("mathematics", "primary 4", "fractions"), 10)
            .await;

        assert_eq!(result.status, RetrievalStatus::Error);
        assert!(result.message.unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_missing_field_is_error() {
        let vector = StubEmbedder.embed(vec!["seed".to_string()]).await.unwrap();
        let index = MemoryIndex::with_chunk(maths_chunk(), vector.into_iter().next().unwrap());
        let engine = engine_with(Box::new(index), Box::new(StubEmbedder));

        let result = engine.retrieve(&query("", "primary 4", "fractions"), 10).await;
        assert_eq!(result.status, RetrievalStatus::Error);

        let result = engine.retrieve(&query("math", "primary 4", "  "), 10).await;
        assert_eq!(result.status, RetrievalStatus::Error);
    }

    #[tokio::test]
    async fn test_end_to_end_alias_and_word_grade() {
        // Index: one mathematics/primary 4/nigeria chunk tagged "fractions".
        // Query uses the "math" alias and a spelled-out grade.
        let seed = StubEmbedder
            .embed(vec!["mathematics primary 4 fractions".to_string()])
            .await
            .unwrap()
            .remove(0);
        let index = MemoryIndex::with_chunk(maths_chunk(), seed);
        let engine = engine_with(Box::new(index), Box::new(StubEmbedder));

        let result = engine
            .retrieve(&query("math", "primary four", "fractions"), 10)
            .await;

        assert_eq!(result.status, RetrievalStatus::Valid);
        assert!(result.context.contains("fractions"));
        assert_eq!(result.matches.len(), 1);
        // +1 content hit, +2 topic tag hit
        assert_eq!(result.matches[0].topic_relevance, 3);
    }

    #[tokio::test]
    async fn test_grade_mismatch_is_invalid() {
        let seed = StubEmbedder
            .embed(vec!["mathematics primary 4 fractions".to_string()])
            .await
            .unwrap()
            .remove(0);
        let index = MemoryIndex::with_chunk(maths_chunk(), seed);
        let engine = engine_with(Box::new(index), Box::new(StubEmbedder));

        let result = engine
            .retrieve(&query("mathematics", "primary 6", "fractions"), 10)
            .await;

        assert_eq!(result.status, RetrievalStatus::Invalid);
        assert!(result.context.is_empty());
        assert!(result.alternatives.is_empty());
    }

    #[tokio::test]
    async fn test_zero_topic_relevance_is_invalid() {
        let seed = StubEmbedder
            .embed(vec!["mathematics primary 4 fractions".to_string()])
            .await
            .unwrap()
            .remove(0);
        let index = MemoryIndex::with_chunk(maths_chunk(), seed);
        let engine = engine_with(Box::new(index), Box::new(StubEmbedder));

        let result = engine
            .retrieve(&query("mathematics", "primary 4", "photosynthesis"), 10)
            .await;

        assert_eq!(result.status, RetrievalStatus::Invalid);
    }

    #[tokio::test]
    async fn test_range_chunk_matches_contained_grade() {
        let mut chunk = maths_chunk();
        chunk.grade_level = "primary 4-6".to_string();
        let seed = StubEmbedder
            .embed(vec!["mathematics primary 5 fractions".to_string()])
            .await
            .unwrap()
            .remove(0);
        let index = MemoryIndex::with_chunk(chunk, seed);
        let engine = engine_with(Box::new(index), Box::new(StubEmbedder));

        let result = engine
            .retrieve(&query("mathematics", "primary 5", "fractions"), 10)
            .await;
        assert_eq!(result.status, RetrievalStatus::Valid);

        let result = engine
            .retrieve(&query("mathematics", "primary 7", "fractions"), 10)
            .await;
        assert_eq!(result.status, RetrievalStatus::Invalid);
    }

    #[tokio::test]
    async fn test_topic_relevance_dominates_similarity() {
        let index = MemoryIndex::new();
        {
            let mut points = index.points.lock().unwrap();

            // High similarity but only a content hit
            let mut weak = maths_chunk();
            weak.content = "fractions mentioned in passing".to_string();
            weak.topics = vec![];
            points.push((
                "weak".to_string(),
                StubEmbedder
                    .embed(vec!["mathematics primary 4 fractions".to_string()])
                    .await
                    .unwrap()
                    .remove(0),
                weak,
            ));

            // Lower similarity but tagged with the topic
            let mut strong = maths_chunk();
            strong.content = "equivalent fractions and ordering".to_string();
            points.push((
                "strong".to_string(),
                StubEmbedder
                    .embed(vec!["something rather different".to_string()])
                    .await
                    .unwrap()
                    .remove(0),
                strong,
            ));
        }

        let engine = engine_with(Box::new(index), Box::new(StubEmbedder));
        let result = engine
            .retrieve(&query("mathematics", "primary 4", "fractions"), 10)
            .await;

        assert_eq!(result.status, RetrievalStatus::Valid);
        assert_eq!(result.matches[0].id, "strong");
        assert!(result.matches[0].topic_relevance > result.matches[1].topic_relevance);
        // Context concatenates in rank order with a blank-line separator
        assert!(result
            .context
            .starts_with("equivalent fractions and ordering"));
        assert!(result.context.contains("\n\n"));
    }

    #[tokio::test]
    async fn test_top_k_truncates() {
        let index = MemoryIndex::new();
        {
            let mut points = index.points.lock().unwrap();
            for i in 0..5 {
                let mut chunk = maths_chunk();
                chunk.content = format!("fractions exercise set {}", i);
                points.push((
                    format!("chunk-{}", i),
                    StubEmbedder
                        .embed(vec![format!("mathematics primary 4 exercise {}", i)])
                        .await
                        .unwrap()
                        .remove(0),
                    chunk,
                ));
            }
        }

        let engine = engine_with(Box::new(index), Box::new(StubEmbedder));
        let result = engine
            .retrieve(&query("mathematics", "primary 4", "fractions"), 3)
            .await;

        assert_eq!(result.status, RetrievalStatus::Valid);
        assert_eq!(result.matches.len(), 3);
    }

    #[tokio::test]
    async fn test_upstream_failures_become_error_status() {
        // Stats call failing
        let mut index = MemoryIndex::new();
        index.fail_stats = true;
        let engine = engine_with(Box::new(index), Box::new(StubEmbedder));
        let result = engine
            .retrieve(&query("mathematics", "primary 4", "fractions"), 10)
            .await;
        assert_eq!(result.status, RetrievalStatus::Error);
        assert!(result.message.unwrap().contains("connection refused"));

        // Embedder failing
        let seed = StubEmbedder
            .embed(vec!["mathematics primary 4 fractions".to_string()])
            .await
            .unwrap()
            .remove(0);
        let index = MemoryIndex::with_chunk(maths_chunk(), seed);
        let engine = engine_with(Box::new(index), Box::new(FailingEmbedder));
        let result = engine
            .retrieve(&query("mathematics", "primary 4", "fractions"), 10)
            .await;
        assert_eq!(result.status, RetrievalStatus::Error);
    }
}
