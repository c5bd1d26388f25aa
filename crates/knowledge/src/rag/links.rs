//! Link collection for answers.

use crate::types::DocumentRecord;
use std::collections::HashSet;

/// Distinct non-blank urls of `documents`, in first-seen order.
///
/// Urls are returned exactly as stored.
pub fn collect_links(documents: &[DocumentRecord]) -> Vec<String> {
    let mut seen = HashSet::new();

    documents
        .iter()
        .map(|d| d.url.as_str())
        .filter(|url| !url.trim().is_empty())
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}
