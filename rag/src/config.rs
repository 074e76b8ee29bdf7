use anyhow::{Context, Result};
use std::env;

/// Process-wide engine configuration, loaded once at startup and injected
/// into request handlers. Nothing here is re-read per request.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model: String,
    /// Chunk budget in cl100k tokens.
    pub chunk_size: usize,
    /// Token overlap carried from the tail of one chunk into the next.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per query.
    pub top_k: usize,
    /// Token budget for the context block of a single synthesis call.
    pub max_context_tokens: usize,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let config = Self {
            openai_api_key,
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            chunk_size: parse_env("CHUNK_SIZE", 1024)?,
            chunk_overlap: parse_env("CHUNK_OVERLAP", 200)?,
            top_k: parse_env("RETRIEVAL_TOP_K", 5)?,
            max_context_tokens: parse_env("MAX_CONTEXT_TOKENS", 2800)?,
        };

        if config.chunk_overlap >= config.chunk_size {
            anyhow::bail!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                config.chunk_overlap,
                config.chunk_size
            );
        }

        Ok(config)
    }
}

fn parse_env(key: &str, default: usize) -> Result<usize> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("invalid value for {}: {}", key, value)),
        Err(_) => Ok(default),
    }
}
