//! Pinecone-style REST client for the similarity index.
//!
//! Exposes the two operations the review pipeline needs: namespace-scoped
//! upserts and top-k queries with an optional metadata filter.

use kestrel_core::{KestrelError, VectorConfig};
use serde::{Deserialize, Serialize};

/// A ranked match returned by a similarity query.
///
/// # Examples
///
/// ```
/// use kestrel_context::SimilarityMatch;
///
/// let m = SimilarityMatch {
///     id: "src/auth.py-chunk-3".into(),
///     score: 0.92,
///     metadata: serde_json::json!({ "chunk": "def login(): ...", "filename": "src/auth.py" }),
/// };
/// assert!(m.score > 0.9);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMatch {
    /// Unique identifier of the stored vector (e.g. "file-chunk-ID").
    pub id: String,
    /// Similarity score from the query.
    pub score: f64,
    /// Metadata stored alongside the vector (chunk text, filename, lines).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
    namespace: &'a str,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a serde_json::Value,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    namespace: &'a str,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<SimilarityMatch>,
}

/// HTTP client for the vector similarity store.
///
/// # Examples
///
/// ```
/// use kestrel_core::VectorConfig;
/// use kestrel_context::VectorStoreClient;
///
/// let config = VectorConfig {
///     base_url: Some("https://idx.svc.example.io".into()),
///     api_key: Some("test-key".into()),
///     ..VectorConfig::default()
/// };
/// let client = VectorStoreClient::new(&config).unwrap();
/// ```
pub struct VectorStoreClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for VectorStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl VectorStoreClient {
    /// Create a client from a [`VectorConfig`].
    ///
    /// Falls back to the `VECTOR_API_KEY` env var when no key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Config`] if the index host or API key is
    /// missing.
    pub fn new(config: &VectorConfig) -> Result<Self, KestrelError> {
        let base_url = config.base_url.clone().ok_or_else(|| {
            KestrelError::Config("vector store host not set: set vector.base_url in .kestrel.toml".into())
        })?;
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("VECTOR_API_KEY").ok())
            .ok_or_else(|| {
                KestrelError::Config(
                    "vector store API key not found: set vector.api_key in .kestrel.toml or VECTOR_API_KEY env var".into(),
                )
            })?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Upsert one vector with metadata into a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::VectorStore`] on network or API errors.
    pub async fn upsert(
        &self,
        namespace: &str,
        id: &str,
        values: &[f32],
        metadata: &serde_json::Value,
    ) -> Result<(), KestrelError> {
        let url = format!("{}/vectors/upsert", self.base_url);
        let body = UpsertRequest {
            vectors: vec![UpsertVector {
                id,
                values,
                metadata,
            }],
            namespace,
        };

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| KestrelError::VectorStore(format!("upsert request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(KestrelError::VectorStore(format!(
                "upsert error {status}: {body_text}"
            )));
        }

        Ok(())
    }

    /// Query the `top_k` nearest vectors in a namespace.
    ///
    /// A filter with no keys is treated the same as no filter. An absent
    /// `matches` field in the response deserializes as an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::VectorStore`] on network errors or when the
    /// response does not have the expected shape.
    pub async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
        filter: Option<serde_json::Value>,
    ) -> Result<Vec<SimilarityMatch>, KestrelError> {
        let url = format!("{}/query", self.base_url);
        let filter = filter.filter(|f| f.as_object().is_some_and(|m| !m.is_empty()));
        let body = QueryRequest {
            vector,
            top_k,
            namespace,
            include_metadata: true,
            filter,
        };

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| KestrelError::VectorStore(format!("query request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(KestrelError::VectorStore(format!(
                "query error {status}: {body_text}"
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| KestrelError::VectorStore(format!("unexpected query response: {e}")))?;

        Ok(parsed.matches)
    }
}

/// Join the `chunk` metadata fields of ranked matches into one context
/// string for the prompt assembler.
///
/// Matches without a string `chunk` field are skipped. Returns `None` when
/// nothing usable remains, so callers can omit the context section entirely.
///
/// # Examples
///
/// ```
/// use kestrel_context::store::context_from_matches;
/// use kestrel_context::SimilarityMatch;
///
/// let matches = vec![SimilarityMatch {
///     id: "c1".into(),
///     score: 0.9,
///     metadata: serde_json::json!({ "chunk": "fn helper() {}" }),
/// }];
/// assert_eq!(context_from_matches(&matches).as_deref(), Some("fn helper() {}"));
/// ```
pub fn context_from_matches(matches: &[SimilarityMatch]) -> Option<String> {
    let chunks: Vec<&str> = matches
        .iter()
        .filter_map(|m| m.metadata.get("chunk").and_then(|c| c.as_str()))
        .collect();

    if chunks.is_empty() {
        None
    } else {
        Some(chunks.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_requires_host_and_key() {
        let config = VectorConfig::default();
        assert!(VectorStoreClient::new(&config).is_err());

        let config = VectorConfig {
            base_url: Some("https://idx.svc.example.io/".into()),
            api_key: Some("k".into()),
            ..VectorConfig::default()
        };
        let client = VectorStoreClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://idx.svc.example.io");
    }

    #[test]
    fn match_deserializes_without_metadata() {
        let m: SimilarityMatch =
            serde_json::from_str(r#"{"id":"a","score":0.5}"#).unwrap();
        assert_eq!(m.id, "a");
        assert!(m.metadata.is_null());
    }

    #[test]
    fn query_response_defaults_to_empty_matches() {
        let parsed: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.matches.is_empty());
    }

    #[test]
    fn query_request_serializes_camel_case() {
        let req = QueryRequest {
            vector: &[0.1, 0.2],
            top_k: 5,
            namespace: "code-context",
            include_metadata: true,
            filter: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["topK"], 5);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("filter").is_none());
    }

    #[test]
    fn context_joins_chunks_in_rank_order() {
        let matches = vec![
            SimilarityMatch {
                id: "1".into(),
                score: 0.9,
                metadata: serde_json::json!({ "chunk": "first" }),
            },
            SimilarityMatch {
                id: "2".into(),
                score: 0.8,
                metadata: serde_json::json!({ "filename": "no chunk here" }),
            },
            SimilarityMatch {
                id: "3".into(),
                score: 0.7,
                metadata: serde_json::json!({ "chunk": "second" }),
            },
        ];
        assert_eq!(
            context_from_matches(&matches).as_deref(),
            Some("first\n\nsecond")
        );
    }

    #[test]
    fn context_is_none_when_no_chunks() {
        assert!(context_from_matches(&[]).is_none());
    }
}
