use crate::models::DocumentChunk;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Vocabulary cap for the TF-IDF space.
const VOCABULARY_LIMIT: usize = 1000;
/// Floor on embedding dimensionality so tiny documents still get usable vectors.
const MIN_DIMENSIONS: usize = 100;

/// Ephemeral in-memory vector index over one document's chunks.
///
/// The vocabulary and IDF table are derived from the indexed chunks
/// themselves, and queries are embedded in that same space. The index lives
/// for one request and is dropped with it.
pub struct VectorIndex {
    chunks: Vec<DocumentChunk>,
    vocabulary: HashMap<String, usize>,
    idf_scores: HashMap<String, f32>,
}

impl VectorIndex {
    pub fn build(mut chunks: Vec<DocumentChunk>) -> Self {
        let mut word_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_frequencies: HashMap<String, usize> = HashMap::new();
        let total_chunks = chunks.len();

        for chunk in &chunks {
            let words = tokenize(&chunk.content);
            let unique_words: HashSet<_> = words.iter().collect();

            for word in &words {
                *word_counts.entry(word.clone()).or_insert(0) += 1;
            }
            for word in unique_words {
                *doc_frequencies.entry(word.clone()).or_insert(0) += 1;
            }
        }

        let idf_scores: HashMap<String, f32> = doc_frequencies
            .iter()
            .map(|(word, df)| {
                let idf = (total_chunks as f32 / *df as f32).ln();
                (word.clone(), idf)
            })
            .collect();

        let mut word_freq_pairs: Vec<_> = word_counts.into_iter().collect();
        word_freq_pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let vocabulary: HashMap<String, usize> = word_freq_pairs
            .into_iter()
            .take(VOCABULARY_LIMIT)
            .enumerate()
            .map(|(idx, (word, _))| (word, idx))
            .collect();

        chunks.par_iter_mut().for_each(|chunk| {
            chunk.embedding = Some(tfidf_embedding(&chunk.content, &vocabulary, &idf_scores));
        });

        Self {
            chunks,
            vocabulary,
            idf_scores,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Rank every chunk by cosine similarity to the query and return the top k.
    pub fn top_k(&self, query: &str, k: usize) -> Vec<&DocumentChunk> {
        let query_embedding = tfidf_embedding(query, &self.vocabulary, &self.idf_scores);

        let mut scored: Vec<(&DocumentChunk, f32)> = self
            .chunks
            .iter()
            .filter_map(|chunk| {
                chunk
                    .embedding
                    .as_ref()
                    .map(|embedding| (chunk, cosine_similarity(&query_embedding, embedding)))
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        scored.into_iter().take(k).map(|(chunk, _)| chunk).collect()
    }
}

fn tfidf_embedding(
    text: &str,
    vocabulary: &HashMap<String, usize>,
    idf_scores: &HashMap<String, f32>,
) -> Vec<f32> {
    let mut embedding = vec![0.0; vocabulary.len().max(MIN_DIMENSIONS)];
    let words = tokenize(text);
    let total_words = words.len() as f32;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in &words {
        *counts.entry(word.as_str()).or_insert(0) += 1;
    }

    for (word, count) in counts {
        if let Some(&idx) = vocabulary.get(word) {
            let tf = count as f32 / total_words;
            let idf = idf_scores.get(word).unwrap_or(&1.0);
            embedding[idx] = tf * idf;
        }
    }

    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in embedding.iter_mut() {
            *value /= norm;
        }
    }

    embedding
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|word| word.len() > 2)
        .collect()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let min_len = a.len().min(b.len());

    let dot_product: f32 = a[..min_len].iter().zip(b[..min_len].iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a[..min_len].iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b[..min_len].iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
