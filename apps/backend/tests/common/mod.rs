//! Common test utilities for integration tests.
//!
//! Provides a scripted in-process content provider and a TestContext that
//! wires the full router over in-memory stores.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::TestServer;
use futures::FutureExt;

use hsk_tutor_backend::config::TutorSettings;
use hsk_tutor_backend::services::provider::{ContentProvider, ProviderError, ProviderFuture};
use hsk_tutor_backend::store::Storage;
use hsk_tutor_backend::{build_router, AppState};
use tutor_core::types::{ContentKind, ContentRequest};

/// Provider that generates deterministic items for any request.
#[derive(Default)]
pub struct ScriptedProvider {
    calls: AtomicUsize,
    fail: AtomicBool,
    empty: AtomicBool,
    delay_ms: AtomicUsize,
}

impl ScriptedProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Answer every request with zero items.
    pub fn set_empty(&self, empty: bool) {
        self.empty.store(empty, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as usize, Ordering::SeqCst);
    }
}

impl ContentProvider for ScriptedProvider {
    fn request<'a>(&'a self, request: &'a ContentRequest) -> ProviderFuture<'a> {
        async move {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay as u64)).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError::Upstream {
                    status: 503,
                    message: "provider overloaded".to_string(),
                });
            }
            if self.empty.load(Ordering::SeqCst) {
                return Ok(Vec::new());
            }
            Ok((0..request.count)
                .map(|i| fixtures::generated_item(request, call, i))
                .collect())
        }
        .boxed()
    }
}

/// Test context holding the provider, storage and router.
pub struct TestContext {
    pub provider: Arc<ScriptedProvider>,
    pub storage: Storage,
    pub state: AppState,
    app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(fixtures::test_settings())
    }

    pub fn with_settings(settings: TutorSettings) -> Self {
        Self::with_storage(Storage::in_memory(), settings)
    }

    /// Build a context over an existing storage, e.g. to simulate a restart.
    pub fn with_storage(storage: Storage, settings: TutorSettings) -> Self {
        let provider = Arc::new(ScriptedProvider::default());
        let state = AppState::new(provider.clone(), storage.clone(), &settings);
        let app = build_router(state.clone());
        Self {
            provider,
            storage,
            state,
            app,
        }
    }

    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).unwrap()
    }
}

/// Path for a content route.
pub fn content_path(kind: ContentKind, level: u8, action: &str) -> String {
    format!("/api/content/{}/{}/{}", kind, level, action)
}
