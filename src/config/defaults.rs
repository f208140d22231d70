//! Default values for configuration

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_qdrant_url() -> String {
    std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://127.0.0.1:6334".to_string())
}

/// Default environment variable name for Qdrant API key
pub fn default_qdrant_api_key_env() -> String {
    "".to_string()
}

/// Default collection name
pub fn default_collection_name() -> String {
    "curriculum_chunks".to_string()
}

/// Default country tag for index filtering and pattern tables
pub fn default_country() -> String {
    "nigeria".to_string()
}

/// Default embedding model (384-dim sentence embedding)
pub fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

/// Default embedding dimension
pub fn default_embedding_dimension() -> usize {
    384
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default maximum characters per chunk
pub fn default_chunk_max_chars() -> usize {
    500
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    50
}

/// Default minimum chunk size
pub fn default_chunk_min_chars() -> usize {
    50
}

/// Default number of results returned by retrieval
pub fn default_retrieval_top_k() -> usize {
    10
}

/// Default candidate pool requested from the index before filtering
pub fn default_retrieval_pool_size() -> usize {
    30
}

/// Default completion backend base URL (OpenAI-compatible)
pub fn default_generation_base_url() -> String {
    std::env::var("CURRIGEN_COMPLETION_URL")
        .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string())
}

/// Default environment variable name for the completion API key
pub fn default_generation_api_key_env() -> String {
    "CURRIGEN_COMPLETION_API_KEY".to_string()
}

/// Default completion model
pub fn default_generation_model() -> String {
    "llama3-70b-8192".to_string()
}

/// Default sampling temperature for generation
pub fn default_generation_temperature() -> f32 {
    0.3
}

/// Default max tokens per generated document
pub fn default_generation_max_tokens() -> u32 {
    4096
}

/// Default request timeout for the completion backend in seconds
pub fn default_generation_timeout_secs() -> u64 {
    120
}
