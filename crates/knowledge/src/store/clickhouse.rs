//! ClickHouse document store over the HTTP interface.
//!
//! ClickHouse HTTP API: https://clickhouse.com/docs/en/interfaces/http
//!
//! The query vector, table and limit travel as query parameters and are bound
//! by the server. Rows come back as `JSONEachRow` and are decoded line by line
//! while the response body is still arriving.

use super::{DocumentStore, DocumentStream};
use crate::types::DocumentRecord;
use assist_core::config::ClickHouseConfig;
use assist_core::{AppError, AppResult};
use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

/// Nearest-neighbor query. Every column is stringified so nullable and
/// numeric columns decode into plain strings. Undefined distances (zero
/// vectors) rank as unrelated.
const SEARCH_SQL: &str = "\
SELECT
    ifNull(toString(Id), '') AS id,
    ifNull(toString(Source), '') AS source,
    ifNull(toString(BusinessLineId), '') AS business_line_id,
    ifNull(toString(Direction), '') AS direction,
    ifNull(toString(Product), '') AS product,
    ifNull(toString(Type), '') AS type,
    ifNull(toString(Description), '') AS description,
    ifNull(toString(Title), '') AS title,
    ifNull(toString(Url), '') AS url,
    ifNull(toString(ParentTitle), '') AS parent_title,
    ifNull(toString(ParentUrl), '') AS parent_url,
    ifNull(toString(ChunkType), '') AS chunk_type,
    ifNotFinite(cosineDistance(Embedding, {vector:Array(Float32)}), 1.0) AS distance
FROM {table:Identifier}
ORDER BY distance ASC
LIMIT {limit:UInt64}
FORMAT JSONEachRow";

/// ClickHouse-backed document store.
pub struct ClickHouseStore {
    endpoint: String,
    table: String,
    database: Option<String>,
    user: Option<String>,
    password: Option<String>,
    oversample: usize,
    client: reqwest::Client,
}

impl ClickHouseStore {
    /// Create a store; no connection is made until the first search.
    pub fn new(config: &ClickHouseConfig, oversample: usize) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| {
                AppError::Storage(format!("Failed to create HTTP client for ClickHouse: {}", e))
            })?;

        Ok(Self {
            endpoint: config.endpoint(),
            table: config.table.clone(),
            database: config.database.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            oversample,
            client,
        })
    }

    /// Query parameters bound by the server.
    fn query_params(&self, vector: &[f32], limit: usize) -> Vec<(String, String)> {
        let mut params = vec![
            ("param_vector".to_string(), format_vector(vector)),
            ("param_table".to_string(), self.table.clone()),
            (
                "param_limit".to_string(),
                limit.saturating_add(self.oversample).to_string(),
            ),
        ];

        if let Some(database) = &self.database {
            params.push(("database".to_string(), database.clone()));
        }

        params
    }
}

/// Render a vector as a ClickHouse array literal.
fn format_vector(vector: &[f32]) -> String {
    let values: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

#[async_trait::async_trait]
impl DocumentStore for ClickHouseStore {
    fn backend_name(&self) -> &str {
        "clickhouse"
    }

    async fn search_stream(&self, vector: &[f32], limit: usize) -> AppResult<DocumentStream> {
        tracing::debug!(
            "Querying ClickHouse table '{}' (limit {} + {})",
            self.table,
            limit,
            self.oversample
        );

        let mut request = self
            .client
            .post(&self.endpoint)
            .query(&self.query_params(vector, limit))
            .body(SEARCH_SQL);

        if let Some(user) = &self.user {
            request = request.header("X-ClickHouse-User", user);
        }
        if let Some(password) = &self.password {
            request = request.header("X-ClickHouse-Key", password);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to reach ClickHouse: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(AppError::Storage(format!(
                "ClickHouse query failed ({}): {}",
                status,
                error_text.trim()
            )));
        }

        let body = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| AppError::Storage(format!("ClickHouse stream interrupted: {}", e)))
        });

        Ok(decode_rows(body))
    }
}

/// Splits a byte stream into `JSONEachRow` lines and decodes them.
#[derive(Debug, Default)]
pub struct RowDecoder {
    buffer: Vec<u8>,
    last_distance: Option<f64>,
    rows: usize,
}

impl RowDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every row it completed.
    pub fn push(&mut self, chunk: &[u8]) -> AppResult<Vec<DocumentRecord>> {
        self.buffer.extend_from_slice(chunk);

        let mut rows = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(row) = self.decode_line(&line)? {
                rows.push(row);
            }
        }

        Ok(rows)
    }

    /// Decode whatever is left after the body ended.
    pub fn finish(&mut self) -> AppResult<Option<DocumentRecord>> {
        let rest = std::mem::take(&mut self.buffer);
        let row = self.decode_line(&rest)?;
        tracing::debug!("Decoded {} rows from ClickHouse", self.rows);
        Ok(row)
    }

    fn decode_line(&mut self, line: &[u8]) -> AppResult<Option<DocumentRecord>> {
        if line.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let row: DocumentRecord = serde_json::from_slice(line).map_err(|e| {
            AppError::Storage(format!(
                "Failed to decode ClickHouse row {}: {}",
                self.rows + 1,
                e
            ))
        })?;

        if let Some(previous) = self.last_distance {
            if row.distance < previous {
                tracing::warn!(
                    "ClickHouse returned rows out of distance order ({} after {})",
                    row.distance,
                    previous
                );
            }
        }

        self.last_distance = Some(row.distance);
        self.rows += 1;
        Ok(Some(row))
    }
}

struct RowStreamState<S> {
    body: Pin<Box<S>>,
    decoder: RowDecoder,
    ready: VecDeque<DocumentRecord>,
    done: bool,
}

/// Turn a body stream into a stream of decoded rows.
///
/// The first error ends the stream.
pub fn decode_rows<S, B>(body: S) -> DocumentStream
where
    S: Stream<Item = AppResult<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = RowStreamState {
        body: Box::pin(body),
        decoder: RowDecoder::new(),
        ready: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(row) = state.ready.pop_front() {
                return Some((Ok(row), state));
            }

            if state.done {
                return None;
            }

            let decoded = match state.body.next().await {
                Some(Ok(chunk)) => state.decoder.push(chunk.as_ref()),
                Some(Err(e)) => Err(e),
                None => {
                    state.done = true;
                    state.decoder.finish().map(|row| row.into_iter().collect())
                }
            };

            match decoded {
                Ok(rows) => state.ready.extend(rows),
                Err(e) => {
                    state.done = true;
                    state.ready.clear();
                    return Some((Err(e), state));
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn row(id: &str, distance: f64) -> String {
        format!(
            "{{\"id\":\"{}\",\"description\":\"text {}\",\"url\":\"https://example.com/{}\",\"distance\":{}}}\n",
            id, id, id, distance
        )
    }

    fn config() -> ClickHouseConfig {
        ClickHouseConfig {
            table: "knowledge.documents".to_string(),
            database: Some("support".to_string()),
            ..ClickHouseConfig::default()
        }
    }

    #[test]
    fn test_query_is_parameterized() {
        assert!(SEARCH_SQL.contains("{vector:Array(Float32)}"));
        assert!(SEARCH_SQL.contains("{table:Identifier}"));
        assert!(SEARCH_SQL.contains("{limit:UInt64}"));
        assert!(SEARCH_SQL.contains("ORDER BY distance ASC"));
        assert!(SEARCH_SQL.contains("ifNotFinite(cosineDistance("));
    }

    #[test]
    fn test_query_params() {
        let store = ClickHouseStore::new(&config(), 500).unwrap();
        let params = store.query_params(&[0.5, -1.0], 5);

        assert!(params.contains(&("param_vector".to_string(), "[0.5,-1]".to_string())));
        assert!(params.contains(&(
            "param_table".to_string(),
            "knowledge.documents".to_string()
        )));
        assert!(params.contains(&("param_limit".to_string(), "505".to_string())));
        assert!(params.contains(&("database".to_string(), "support".to_string())));
    }

    #[test]
    fn test_decoder_handles_split_lines() {
        let mut decoder = RowDecoder::new();
        let data = format!("{}{}", row("a", 0.1), row("b", 0.2));
        let (first, second) = data.split_at(30);

        assert!(decoder.push(first.as_bytes()).unwrap().is_empty());
        let rows = decoder.push(second.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].id, "b");
        assert!(decoder.finish().unwrap().is_none());
    }

    #[test]
    fn test_decoder_final_line_without_newline() {
        let mut decoder = RowDecoder::new();
        let line = row("z", 0.9);
        assert!(decoder
            .push(line.trim_end().as_bytes())
            .unwrap()
            .is_empty());

        let last = decoder.finish().unwrap().unwrap();
        assert_eq!(last.id, "z");
    }

    #[test]
    fn test_decoder_accepts_null_distance() {
        let mut decoder = RowDecoder::new();
        let data = format!(
            "{}{}",
            row("a", 0.4),
            "{\"id\":\"b\",\"description\":\"zero vector\",\"distance\":null}\n"
        );

        let rows = decoder.push(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].id, "b");
        assert_eq!(rows[1].distance, crate::types::UNRELATED_DISTANCE);
    }

    #[test]
    fn test_decoder_rejects_garbage() {
        let mut decoder = RowDecoder::new();
        assert!(matches!(
            decoder.push(b"Code: 60. DB::Exception\n"),
            Err(AppError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_decode_rows_stream() {
        let data = format!("{}{}{}", row("a", 0.1), row("b", 0.2), row("c", 0.3));
        let chunks: Vec<AppResult<Vec<u8>>> = data
            .as_bytes()
            .chunks(7)
            .map(|c| Ok(c.to_vec()))
            .collect();

        let rows: Vec<DocumentRecord> = decode_rows(stream::iter(chunks))
            .try_collect()
            .await
            .unwrap();

        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(rows.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_decode_rows_stops_on_error() {
        let chunks: Vec<AppResult<Vec<u8>>> = vec![
            Ok(row("a", 0.1).into_bytes()),
            Err(AppError::Storage("connection reset".to_string())),
            Ok(row("b", 0.2).into_bytes()),
        ];

        let results: Vec<AppResult<DocumentRecord>> =
            decode_rows(stream::iter(chunks)).collect().await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_storage_error() {
        let config = ClickHouseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            table: "documents".to_string(),
            timeout_secs: 2,
            ..ClickHouseConfig::default()
        };
        let store = ClickHouseStore::new(&config, 0).unwrap();

        assert!(matches!(
            store.search(&[0.0, 1.0], 5).await,
            Err(AppError::Storage(_))
        ));
    }
}
