//! Document filtering and selection.
//!
//! Rows whose description is too short to be useful context are dropped, and
//! the closest `limit` survivors are kept in their original order.

use crate::store::DocumentStream;
use crate::types::DocumentRecord;
use assist_core::AppResult;
use futures::StreamExt;

/// Whether a document carries enough text to be used as context.
pub fn is_informative(document: &DocumentRecord, min_description_chars: usize) -> bool {
    document.description_len() > min_description_chars
}

/// Drop every document with a description of `min_description_chars` or fewer.
pub fn filter_informative(
    documents: Vec<DocumentRecord>,
    min_description_chars: usize,
) -> Vec<DocumentRecord> {
    documents
        .into_iter()
        .filter(|d| is_informative(d, min_description_chars))
        .collect()
}

/// Filter, then take the first `limit` survivors.
pub fn select(
    documents: Vec<DocumentRecord>,
    limit: usize,
    min_description_chars: usize,
) -> Vec<DocumentRecord> {
    documents
        .into_iter()
        .filter(|d| is_informative(d, min_description_chars))
        .take(limit)
        .collect()
}

/// Same as [`select`], pulling rows from a search stream.
///
/// Stops reading once `limit` survivors are found; the rest of the stream is
/// dropped.
pub async fn select_from_stream(
    mut rows: DocumentStream,
    limit: usize,
    min_description_chars: usize,
) -> AppResult<Vec<DocumentRecord>> {
    let mut selected = Vec::with_capacity(limit);
    let mut scanned = 0usize;

    while selected.len() < limit {
        let Some(row) = rows.next().await else {
            break;
        };
        let row = row?;
        scanned += 1;

        if is_informative(&row, min_description_chars) {
            selected.push(row);
        }
    }

    tracing::debug!(
        "Selected {} of {} scanned documents (limit {})",
        selected.len(),
        scanned,
        limit
    );

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assist_core::AppError;
    use futures::stream;

    fn doc(id: &str, description_len: usize) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            description: "д".repeat(description_len),
            ..DocumentRecord::default()
        }
    }

    fn ids(documents: &[DocumentRecord]) -> Vec<&str> {
        documents.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_boundary_is_exclusive() {
        assert!(!is_informative(&doc("a", 100), 100));
        assert!(is_informative(&doc("b", 101), 100));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 60 two-byte characters is 120 bytes
        assert!(!is_informative(&doc("a", 60), 100));
    }

    #[test]
    fn test_filter_preserves_order() {
        let documents = vec![doc("a", 150), doc("b", 20), doc("c", 300), doc("d", 100)];
        let kept = filter_informative(documents, 100);
        assert_eq!(ids(&kept), vec!["a", "c"]);
    }

    #[test]
    fn test_select_limit() {
        let documents: Vec<_> = (0..8).map(|i| doc(&i.to_string(), 200)).collect();
        let selected = select(documents, 5, 100);
        assert_eq!(ids(&selected), vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_select_fewer_survivors_than_limit() {
        let documents = vec![doc("a", 10), doc("b", 200), doc("c", 50)];
        let selected = select(documents, 5, 100);
        assert_eq!(ids(&selected), vec!["b"]);

        assert!(select(vec![doc("x", 1)], 5, 100).is_empty());
    }

    #[tokio::test]
    async fn test_select_from_stream_stops_early() {
        let rows: Vec<AppResult<DocumentRecord>> = vec![
            Ok(doc("a", 200)),
            Ok(doc("b", 5)),
            Ok(doc("c", 200)),
            Err(AppError::Storage("never read".to_string())),
        ];

        let selected = select_from_stream(stream::iter(rows).boxed(), 2, 100)
            .await
            .unwrap();
        assert_eq!(ids(&selected), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_select_from_stream_propagates_errors() {
        let rows: Vec<AppResult<DocumentRecord>> = vec![
            Ok(doc("a", 5)),
            Err(AppError::Storage("broken row".to_string())),
        ];

        let result = select_from_stream(stream::iter(rows).boxed(), 3, 100).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
