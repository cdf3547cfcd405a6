use std::sync::Arc;
use std::time::Instant;

use tokio::net::TcpListener;
use tokio::sync::oneshot;

use moodtune_server::config::{CatalogSettings, InferenceBackend, InferenceSettings, TtsSettings};
use moodtune_server::recommend::Recommender;
use moodtune_server::server::metrics::init_metrics;
use moodtune_server::server::server::make_app;
use moodtune_server::tts::TtsClient;
use moodtune_server::{make_inferer, CatalogClient, CatalogSearcher, RequestsLoggingLevel, ServerConfig};

use super::constants::{SERVER_READY_POLL_INTERVAL, SERVER_READY_TIMEOUT};
use super::stubs::{StubBehavior, StubServer};

/// A running instance of the app wired against stub external services.
///
/// The server listens on an ephemeral port and is shut down gracefully when
/// the TestServer is dropped.
pub struct TestServer {
    pub base_url: String,
    pub stubs: StubServer,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawn a server with default stub behavior and no TTS.
    pub async fn spawn() -> Self {
        Self::spawn_with(StubBehavior::default(), false).await
    }

    /// Spawn a server with the given stub behavior, optionally with TTS
    /// enabled.
    pub async fn spawn_with(behavior: StubBehavior, tts_enabled: bool) -> Self {
        init_metrics();

        let stubs = StubServer::spawn(behavior).await;

        let inference = InferenceSettings {
            backend: InferenceBackend::VisionChat,
            base_url: stubs.base_url.clone(),
            model: "stub-model".to_string(),
            embeddings_model: "stub-embeddings".to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_sec: 5,
        };
        let catalog = CatalogSettings {
            token_url: format!("{}/api/token", stubs.base_url),
            api_base: stubs.base_url.clone(),
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            per_keyword_limit: 2,
            timeout_sec: 5,
        };
        let tts = tts_enabled.then(|| {
            TtsClient::new(&TtsSettings {
                base_url: stubs.base_url.clone(),
                model: "stub-tts".to_string(),
                voice: "alloy".to_string(),
                api_key: None,
                timeout_sec: 5,
            })
        });

        let catalog_client: Arc<dyn CatalogSearcher> = Arc::new(CatalogClient::new(&catalog));
        let recommender = Arc::new(Recommender::new(
            make_inferer(&inference),
            catalog_client,
            tts,
        ));

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port: 0,
            frontend_dir_path: None,
        };
        let app = make_app(config, recommender);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server listener");
        let port = listener
            .local_addr()
            .expect("Failed to read test server address")
            .port();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Test server failed");
        });

        let server = Self {
            base_url: format!("http://127.0.0.1:{port}"),
            stubs,
            shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::new();
        let url = format!("{}/health", self.base_url);
        let deadline = Instant::now() + SERVER_READY_TIMEOUT;
        loop {
            if let Ok(response) = client.get(&url).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            if Instant::now() > deadline {
                panic!("Test server did not become ready in time");
            }
            tokio::time::sleep(SERVER_READY_POLL_INTERVAL).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
