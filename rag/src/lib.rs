pub mod config;
pub mod document_processor;
pub mod embedding_service;
pub mod models;
pub mod openai_service;
pub mod prompts;
pub mod query_service;

pub use config::EngineConfig;
pub use document_processor::DocumentProcessor;
pub use embedding_service::VectorIndex;
pub use models::*;
pub use openai_service::OpenAiService;
pub use prompts::ExtractionTask;
pub use query_service::QueryService;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Process-wide extraction pipeline: PDF parsing, per-request indexing, and
/// the contract-terms query. Built once at startup and shared across
/// requests; each request still gets its own index.
pub struct ExtractionEngine {
    processor: DocumentProcessor,
    query_service: QueryService,
    task: ExtractionTask,
}

impl ExtractionEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let bpe = Arc::new(tiktoken_rs::cl100k_base()?);
        let processor = DocumentProcessor::new(&config, bpe)?;
        let openai = Arc::new(OpenAiService::new(&config));
        let query_service = QueryService::new(openai, &config);

        Ok(Self {
            processor,
            query_service,
            task: prompts::contract_terms_task(),
        })
    }

    /// Run the full pipeline for one uploaded file: parse, index, query.
    pub async fn extract(&self, path: &Path) -> Result<ContractTerms> {
        let document = self.processor.load_pdf(path)?;
        log::info!(
            "Indexing {} ({} chars, {} chunks)",
            document.filename,
            document.content.chars().count(),
            document.chunks.len()
        );

        let index = VectorIndex::build(document.chunks);
        self.query_service.run(&index, &self.task).await
    }
}
