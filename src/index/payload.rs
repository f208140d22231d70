//! Payload schema for curriculum chunks stored in the vector index

use qdrant_client::qdrant::{PointStruct, Value as QdrantValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// A unit of curriculum text with its retrieval metadata.
///
/// Chunks are immutable once stored: identity is derived from content, so
/// re-ingestion creates new points rather than mutating existing ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumChunk {
    /// The chunk text itself (also embedded)
    pub content: String,

    /// Canonical subject name (exact-match filter field)
    pub subject: String,

    /// Grade level, single ("primary 4") or range ("primary 4-6")
    pub grade_level: String,

    /// Country tag (exact-match filter field)
    pub country: String,

    /// Source document path or name
    pub source: String,

    /// Page number within the source document
    pub page: i64,

    /// Document type ("curriculum", "syllabus", "textbook", ...)
    pub document_type: String,

    /// Chunk index within the document
    pub chunk_index: i64,

    /// Curated topic tags covered by the document
    #[serde(default)]
    pub topics: Vec<String>,
}

impl CurriculumChunk {
    /// Convert to Qdrant payload format
    pub fn to_qdrant_payload(self) -> HashMap<String, QdrantValue> {
        let mut map = HashMap::new();

        map.insert("content".to_string(), string_to_qdrant(&self.content));
        map.insert("subject".to_string(), string_to_qdrant(&self.subject));
        map.insert("grade_level".to_string(), string_to_qdrant(&self.grade_level));
        map.insert("country".to_string(), string_to_qdrant(&self.country));
        map.insert("source".to_string(), string_to_qdrant(&self.source));
        map.insert("page".to_string(), int_to_qdrant(self.page));
        map.insert(
            "document_type".to_string(),
            string_to_qdrant(&self.document_type),
        );
        map.insert("chunk_index".to_string(), int_to_qdrant(self.chunk_index));

        let values: Vec<QdrantValue> = self.topics.iter().map(|s| string_to_qdrant(s)).collect();
        map.insert(
            "topics".to_string(),
            QdrantValue {
                kind: Some(qdrant_client::qdrant::value::Kind::ListValue(
                    qdrant_client::qdrant::ListValue { values },
                )),
            },
        );

        map
    }
}

impl From<Map<String, Value>> for CurriculumChunk {
    fn from(map: Map<String, Value>) -> Self {
        serde_json::from_value(Value::Object(map)).unwrap_or_else(|_| CurriculumChunk {
            content: String::new(),
            subject: String::new(),
            grade_level: String::new(),
            country: String::new(),
            source: String::new(),
            page: 0,
            document_type: String::new(),
            chunk_index: 0,
            topics: Vec::new(),
        })
    }
}

/// A point ready to be upserted to the index
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: CurriculumChunk,
}

impl ChunkPoint {
    /// Build a point whose id is derived from its content.
    ///
    /// The seed "chunk-{country}-{content_hash}-{index}" is folded into a
    /// v5 UUID so the same chunk always maps to the same point.
    pub fn new(content_hash: &str, vector: Vec<f32>, payload: CurriculumChunk) -> Self {
        let seed = format!(
            "chunk-{}-{}-{}",
            payload.country, content_hash, payload.chunk_index
        );
        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes());

        Self {
            id,
            vector,
            payload,
        }
    }

    /// Convert to qdrant-client PointStruct
    pub fn to_point_struct(self) -> PointStruct {
        let payload_map = self.payload.to_qdrant_payload();
        PointStruct::new(self.id.to_string(), self.vector, payload_map)
    }
}

fn string_to_qdrant(s: &str) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::StringValue(s.to_string())),
    }
}

fn int_to_qdrant(i: i64) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::IntegerValue(i)),
    }
}
