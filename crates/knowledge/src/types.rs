//! Core types for retrieval and answering.

use serde::{Deserialize, Deserializer, Serialize};

/// Distance reported for rows with no defined cosine distance (a zero vector
/// on either side). Equal to the distance between orthogonal vectors.
pub const UNRELATED_DISTANCE: f64 = 1.0;

/// A document row returned by nearest-neighbor search.
///
/// Every textual column is stringified by the store, so nullable or numeric
/// columns arrive as (possibly empty) strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentRecord {
    pub id: String,
    pub source: String,
    pub business_line_id: String,
    pub direction: String,
    pub product: String,

    #[serde(rename = "type")]
    pub doc_type: String,

    /// Text used as answer context
    pub description: String,
    pub title: String,

    /// Link cited back to the caller
    pub url: String,
    pub parent_title: String,
    pub parent_url: String,
    pub chunk_type: String,

    /// Cosine distance to the query vector (lower is closer)
    #[serde(deserialize_with = "distance_or_unrelated")]
    pub distance: f64,
}

impl DocumentRecord {
    /// Number of Unicode scalar values in the description.
    pub fn description_len(&self) -> usize {
        self.description.chars().count()
    }
}

/// ClickHouse writes NaN as `null` in JSON output.
fn distance_or_unrelated<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let distance = Option::<f64>::deserialize(deserializer)?;
    Ok(distance
        .filter(|d| d.is_finite())
        .unwrap_or(UNRELATED_DISTANCE))
}

/// Answer produced by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerResult {
    /// Generated reply
    pub text: String,

    /// Deduplicated urls of the documents used as context
    pub links: Vec<String>,
}
