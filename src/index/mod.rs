//! Vector index integration
//!
//! This module defines the `VectorIndex` seam the retrieval engine works
//! against, plus the Qdrant implementation:
//! - Collection management (cosine distance, fixed dimension)
//! - Point upsert
//! - Filtered similarity search (exact-match country + subject)
//! - Vector count for the empty-index gate

mod payload;

pub use payload::*;

use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, ScalarQuantizationBuilder,
    SearchPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::Value;
use tracing::{debug, info};

/// Conjunctive exact-match filter applied to every similarity search
#[derive(Debug, Clone)]
pub struct IndexFilter {
    pub country: String,
    pub subject: String,
}

/// A single similarity-search hit
#[derive(Debug, Clone)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    pub chunk: CurriculumChunk,
}

/// Seam between the retrieval engine and the vector store.
///
/// The engine only needs these three operations; tests substitute an
/// in-memory implementation.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Total number of stored vectors (0 means nothing was ingested yet)
    async fn total_vectors(&self) -> Result<u64>;

    /// Similarity search with a conjunctive exact-match metadata filter
    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: &IndexFilter,
    ) -> Result<Vec<IndexMatch>>;

    /// Insert or overwrite points
    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<()>;
}

/// Qdrant-backed vector index
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantIndex {
    /// Connect to Qdrant using config
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::new(
            &config.qdrant_url,
            &config.collection_name,
            config.embedding.dimension,
        )
        .await
    }

    /// Create a new index connection directly with URL and collection name
    pub async fn new(url: &str, collection: &str, dimension: usize) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .skip_compatibility_check()
            .build()
            .map_err(|e| Error::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            dimension,
        })
    }

    /// Ensure the collection exists with correct configuration
    pub async fn ensure_collection(&self) -> Result<()> {
        let exists = self.client.collection_exists(&self.collection).await?;

        if exists {
            debug!("Collection {} already exists", self.collection);
            return Ok(());
        }

        info!(
            "Creating collection {} with dimension {}",
            self.collection, self.dimension
        );

        let vectors_config = VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine);

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(vectors_config)
                    .quantization_config(ScalarQuantizationBuilder::default()),
            )
            .await?;

        info!("Collection {} created successfully", self.collection);
        Ok(())
    }

    /// Check if the collection exists
    pub async fn collection_exists(&self) -> Result<bool> {
        let exists = self.client.collection_exists(&self.collection).await?;
        Ok(exists)
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn total_vectors(&self) -> Result<u64> {
        if !self.client.collection_exists(&self.collection).await? {
            return Ok(0);
        }

        let info = self.client.collection_info(&self.collection).await?;
        let count = info
            .result
            .map(|r| r.points_count.unwrap_or(0))
            .unwrap_or(0);
        Ok(count)
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: &IndexFilter,
    ) -> Result<Vec<IndexMatch>> {
        debug!(
            "Searching collection {} (top_k {}, country '{}', subject '{}')",
            self.collection, top_k, filter.country, filter.subject
        );

        let qdrant_filter = Filter {
            must: vec![
                Condition::matches("country", filter.country.clone()),
                Condition::matches("subject", filter.subject.clone()),
            ],
            should: vec![],
            must_not: vec![],
            min_should: None,
        };

        let search = SearchPointsBuilder::new(&self.collection, vector, top_k as u64)
            .with_payload(true)
            .filter(qdrant_filter);

        let response = self.client.search_points(search).await?;

        let results: Vec<IndexMatch> = response
            .result
            .into_iter()
            .map(|p| {
                let payload: CurriculumChunk = p
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, json_from_qdrant_value(v)))
                    .collect::<serde_json::Map<String, Value>>()
                    .into();

                IndexMatch {
                    id: point_id_to_string(p.id),
                    score: p.score,
                    chunk: payload,
                }
            })
            .collect();

        Ok(results)
    }

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        debug!(
            "Upserting {} points to collection {}",
            points.len(),
            self.collection
        );

        let point_structs: Vec<_> = points.into_iter().map(|p| p.to_point_struct()).collect();

        self.client
            .upsert_points(qdrant_client::qdrant::UpsertPointsBuilder::new(
                &self.collection,
                point_structs,
            ))
            .await?;

        Ok(())
    }
}

/// Convert PointId to string
fn point_id_to_string(id: Option<qdrant_client::qdrant::PointId>) -> String {
    use qdrant_client::qdrant::point_id::PointIdOptions;

    match id.and_then(|i| i.point_id_options) {
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

/// Convert Qdrant value to serde_json Value
fn json_from_qdrant_value(v: qdrant_client::qdrant::Value) -> Value {
    use qdrant_client::qdrant::value::Kind;

    match v.kind {
        Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(json_from_qdrant_value).collect())
        }
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, json_from_qdrant_value(v)))
                .collect(),
        ),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qdrant_value_roundtrip() {
        use qdrant_client::qdrant::value::Kind;

        let v = qdrant_client::qdrant::Value {
            kind: Some(Kind::StringValue("primary 4-6".to_string())),
        };
        assert_eq!(
            json_from_qdrant_value(v),
            Value::String("primary 4-6".to_string())
        );

        let list = qdrant_client::qdrant::Value {
            kind: Some(Kind::ListValue(qdrant_client::qdrant::ListValue {
                values: vec![qdrant_client::qdrant::Value {
                    kind: Some(Kind::StringValue("fractions".to_string())),
                }],
            })),
        };
        assert_eq!(
            json_from_qdrant_value(list),
            Value::Array(vec![Value::String("fractions".to_string())])
        );
    }
}
