//! In-memory document store loaded from a JSONL file.
//!
//! Each line holds one document: the `DocumentRecord` columns plus an
//! `embedding` array. Searches compute cosine distance against every row.

use super::{DocumentStore, DocumentStream};
use crate::types::{DocumentRecord, UNRELATED_DISTANCE};
use assist_core::{AppError, AppResult};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A stored document with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    #[serde(flatten)]
    pub record: DocumentRecord,
    pub embedding: Vec<f32>,
}

/// Brute-force store for development and tests.
#[derive(Debug)]
pub struct MemoryStore {
    documents: Vec<StoredDocument>,
    oversample: usize,
}

impl MemoryStore {
    /// Build a store from documents already in memory.
    pub fn new(documents: Vec<StoredDocument>, oversample: usize) -> Self {
        Self {
            documents,
            oversample,
        }
    }

    /// Load documents from a JSONL file.
    pub fn open(path: &Path, oversample: usize) -> AppResult<Self> {
        let file = File::open(path).map_err(|e| {
            AppError::Storage(format!("Failed to open documents file {:?}: {}", path, e))
        })?;

        let reader = BufReader::new(file);
        let mut documents = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                AppError::Storage(format!("Failed to read line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let document: StoredDocument = serde_json::from_str(&line).map_err(|e| {
                AppError::Storage(format!(
                    "Failed to parse line {} in {:?}: {}",
                    line_num + 1,
                    path,
                    e
                ))
            })?;

            documents.push(document);
        }

        tracing::info!("Loaded {} documents from {:?}", documents.len(), path);
        Ok(Self::new(documents, oversample))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Nearest documents, ascending by distance.
    fn nearest(&self, vector: &[f32], limit: usize) -> AppResult<Vec<DocumentRecord>> {
        let mut scored = Vec::with_capacity(self.documents.len());

        for document in &self.documents {
            if document.embedding.len() != vector.len() {
                return Err(AppError::Storage(format!(
                    "Document '{}' has {} dimensions, query has {}",
                    document.record.id,
                    document.embedding.len(),
                    vector.len()
                )));
            }

            let mut record = document.record.clone();
            record.distance = cosine_distance(&document.embedding, vector);
            scored.push(record);
        }

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(limit.saturating_add(self.oversample));
        Ok(scored)
    }
}

/// `1 - cos(a, b)`; a zero vector is at distance 1 from everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return UNRELATED_DISTANCE;
    }

    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn search_stream(&self, vector: &[f32], limit: usize) -> AppResult<DocumentStream> {
        let rows = self.nearest(vector, limit)?;
        tracing::debug!("Memory store matched {} documents", rows.len());
        Ok(stream::iter(rows.into_iter().map(Ok)).boxed())
    }
}
