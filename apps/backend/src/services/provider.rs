//! Client for the generative content provider.

use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Deserialize;
use tutor_core::types::{
    Character, ContentItem, ContentKind, ContentPayload, ContentRequest, DictionaryEntry,
    ExamQuestion, Translation, Vocabulary,
};

/// Provider errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error: {status} - {message}")]
    Upstream { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

pub type ProviderFuture<'a> = BoxFuture<'a, Result<Vec<ContentItem>, ProviderError>>;

/// Source of generated content. Calls are slow, rate-limited and costly.
pub trait ContentProvider: Send + Sync {
    fn request<'a>(&'a self, request: &'a ContentRequest) -> ProviderFuture<'a>;
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    items: Vec<serde_json::Value>,
}

/// Decode one raw payload according to the requested kind.
pub fn decode_payload(
    kind: ContentKind,
    value: serde_json::Value,
) -> Result<ContentPayload, serde_json::Error> {
    Ok(match kind {
        ContentKind::Vocabulary => ContentPayload::Vocabulary(serde_json::from_value::<Vocabulary>(value)?),
        ContentKind::WritingCharacter => {
            ContentPayload::WritingCharacter(serde_json::from_value::<Character>(value)?)
        }
        ContentKind::ExamQuestion => {
            ContentPayload::ExamQuestion(serde_json::from_value::<ExamQuestion>(value)?)
        }
        ContentKind::Translation => {
            ContentPayload::Translation(serde_json::from_value::<Translation>(value)?)
        }
        ContentKind::DictionaryEntry => {
            ContentPayload::DictionaryEntry(serde_json::from_value::<DictionaryEntry>(value)?)
        }
    })
}

/// Tag decoded payloads with the request. Undecodable entries are dropped.
pub fn decode_items(request: &ContentRequest, values: Vec<serde_json::Value>) -> Vec<ContentItem> {
    values
        .into_iter()
        .filter_map(|value| match decode_payload(request.kind, value) {
            Ok(payload) => Some(ContentItem::new(request.clone(), payload)),
            Err(e) => {
                tracing::debug!(kind = %request.kind, "dropping undecodable item: {}", e);
                None
            }
        })
        .collect()
}

/// Provider reached over HTTP with a JSON body.
///
/// POSTs `{kind, level, count, topic}` and expects `{"items": [...]}`.
pub struct HttpContentProvider {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpContentProvider {
    pub fn new(url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn generate(&self, request: &ContentRequest) -> Result<Vec<ContentItem>, ProviderError> {
        let started = Instant::now();

        let mut builder = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream { status, message });
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let items = decode_items(request, body.items);
        tracing::info!(
            kind = %request.kind,
            level = %request.level,
            requested = request.count,
            received = items.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "provider request completed"
        );
        Ok(items)
    }
}

impl ContentProvider for HttpContentProvider {
    fn request<'a>(&'a self, request: &'a ContentRequest) -> ProviderFuture<'a> {
        self.generate(request).boxed()
    }
}
