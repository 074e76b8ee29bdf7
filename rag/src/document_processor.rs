use crate::config::EngineConfig;
use crate::models::{Document, DocumentChunk};
use anyhow::Result;
use pdf_extract::extract_text;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

/// Turns a PDF on disk into a cleaned, chunked [`Document`].
///
/// Chunk boundaries never split a sentence; sentences accumulate until the
/// token budget is hit, and the tail sentences of each chunk are carried into
/// the next one as overlap.
pub struct DocumentProcessor {
    bpe: Arc<CoreBPE>,
    chunk_size: usize,
    chunk_overlap: usize,
    re_control: Regex,
    re_whitespace: Regex,
}

impl DocumentProcessor {
    pub fn new(config: &EngineConfig, bpe: Arc<CoreBPE>) -> Result<Self> {
        Ok(Self {
            bpe,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            re_control: Regex::new(r"[\p{Cc}\p{Cf}]")?,
            re_whitespace: Regex::new(r"\s+")?,
        })
    }

    pub fn load_pdf(&self, path: &Path) -> Result<Document> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.pdf".to_string());

        log::info!("Processing PDF: {}", filename);

        let raw = extract_text(path)?;
        let content = self.clean_text(&raw);
        let chunks = self.create_chunks(&content);

        log::info!("Created {} chunks", chunks.len());

        Ok(Document {
            id: Uuid::new_v4().to_string(),
            filename,
            content,
            chunks,
        })
    }

    /// Collapse whitespace and strip control characters. Currency signs and
    /// punctuation stay put; contract clauses lean on them.
    fn clean_text(&self, text: &str) -> String {
        let cleaned = self.re_control.replace_all(text, " ");
        let cleaned = self.re_whitespace.replace_all(&cleaned, " ");
        cleaned.trim().to_string()
    }

    fn create_chunks(&self, content: &str) -> Vec<DocumentChunk> {
        let sentences: Vec<String> = content
            .unicode_sentences()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let mut chunks = Vec::new();
        // Sentences of the chunk under construction, with their token counts.
        let mut current: Vec<(String, usize)> = Vec::new();
        let mut current_tokens = 0usize;

        for sentence in sentences {
            let tokens = self.count_tokens(&sentence);

            if !current.is_empty() && current_tokens + tokens > self.chunk_size {
                chunks.push(self.finish_chunk(&current, current_tokens));

                // Carry trailing sentences into the next chunk as overlap.
                let mut overlap: Vec<(String, usize)> = Vec::new();
                let mut overlap_tokens = 0usize;
                for (text, count) in current.iter().rev() {
                    if overlap_tokens + count > self.chunk_overlap {
                        break;
                    }
                    overlap_tokens += count;
                    overlap.push((text.clone(), *count));
                }
                overlap.reverse();
                current = overlap;
                current_tokens = overlap_tokens;
            }

            current_tokens += tokens;
            current.push((sentence, tokens));
        }

        if !current.is_empty() {
            chunks.push(self.finish_chunk(&current, current_tokens));
        }

        chunks
    }

    fn finish_chunk(&self, sentences: &[(String, usize)], token_count: usize) -> DocumentChunk {
        let content = sentences
            .iter()
            .map(|(text, _)| text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        DocumentChunk {
            id: Uuid::new_v4().to_string(),
            content,
            token_count,
            embedding: None,
        }
    }

    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}
