use crate::config::EngineConfig;
use crate::embedding_service::VectorIndex;
use crate::models::{ContractTerms, DocumentChunk};
use crate::openai_service::OpenAiService;
use crate::prompts::{self, ExtractionTask};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Query engine: retrieves the most relevant chunks for a task's question,
/// packs them into token-budgeted context batches, and drives the LLM with
/// a question-answering call followed by refine calls for any remaining
/// batches.
pub struct QueryService {
    openai: Arc<OpenAiService>,
    top_k: usize,
    max_context_tokens: usize,
}

impl QueryService {
    pub fn new(openai: Arc<OpenAiService>, config: &EngineConfig) -> Self {
        Self {
            openai,
            top_k: config.top_k,
            max_context_tokens: config.max_context_tokens,
        }
    }

    pub async fn run(&self, index: &VectorIndex, task: &ExtractionTask) -> Result<ContractTerms> {
        let retrieved = index.top_k(task.query, self.top_k);
        log::info!(
            "Retrieved {} of {} chunks for task {}",
            retrieved.len(),
            index.len(),
            task.name
        );

        let batches = self.pack_batches(&retrieved);

        let mut answer = self
            .openai
            .structured_completion(
                prompts::qa_messages(&batches[0], task.query),
                task.schema_name,
                task.schema.clone(),
            )
            .await?;

        for batch in &batches[1..] {
            answer = self
                .openai
                .structured_completion(
                    prompts::refine_messages(batch, task.query, &answer),
                    task.schema_name,
                    task.schema.clone(),
                )
                .await?;
        }

        serde_json::from_str(&answer)
            .with_context(|| format!("model answer did not match the {} schema: {}", task.name, answer))
    }

    /// Compact packing: concatenate retrieved chunks into the fewest batches
    /// whose combined size stays within the context token budget. Always
    /// yields at least one batch; an empty document queries with an empty
    /// context block.
    fn pack_batches(&self, chunks: &[&DocumentChunk]) -> Vec<String> {
        let mut batches = Vec::new();
        let mut current = String::new();
        let mut current_tokens = 0usize;

        for chunk in chunks {
            if !current.is_empty() && current_tokens + chunk.token_count > self.max_context_tokens {
                batches.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(&chunk.content);
            current_tokens += chunk.token_count;
        }

        if !current.is_empty() || batches.is_empty() {
            batches.push(current);
        }

        batches
    }
}
