use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::catalog::CatalogError;
use crate::inference::InferenceError;
use crate::recommend::{RecommendError, Recommender};
use tower_http::services::ServeDir;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::{log_requests, metrics, pages, state::*, ServerConfig};

/// Generous enough for phone photos, small enough to not care about abuse.
const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home() -> Html<String> {
    Html(pages::landing_page())
}

async fn music_form() -> Html<String> {
    Html(pages::music_form_page())
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

/// What the user submitted through the form.
enum Submission {
    Image { data: Vec<u8>, mime: String },
    Text(String),
}

async fn read_submission(mut multipart: Multipart) -> Result<Option<Submission>, String> {
    let mut image: Option<(Vec<u8>, String)> = None;
    let mut text: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("無法讀取表單內容：{}", e))?
    {
        match field.name() {
            Some("image") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("無法讀取上傳的圖片：{}", e))?;
                if data.is_empty() {
                    continue;
                }
                let mime = match infer::get(&data) {
                    Some(kind) if kind.mime_type().starts_with("image/") => {
                        kind.mime_type().to_string()
                    }
                    _ => return Err("無法辨識上傳的圖片格式，請使用常見的圖片檔。".to_string()),
                };
                image = Some((data.to_vec(), mime));
            }
            Some("text") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| format!("無法讀取輸入的文字：{}", e))?;
                if !value.trim().is_empty() {
                    text = Some(value.trim().to_string());
                }
            }
            _ => {}
        }
    }

    // An uploaded image wins over text, matching the form's emphasis
    Ok(match (image, text) {
        (Some((data, mime)), _) => Some(Submission::Image { data, mime }),
        (None, Some(text)) => Some(Submission::Text(text)),
        (None, None) => None,
    })
}

/// Per-kind user messaging; the raw error stays in the logs only.
fn error_response(err: &RecommendError) -> (StatusCode, &'static str, &'static str) {
    match err {
        RecommendError::Inference(InferenceError::Unsupported(_)) => (
            StatusCode::BAD_REQUEST,
            "目前設定的分析後端不支援這種輸入，請改用文字描述。",
            "unsupported_input",
        ),
        RecommendError::Inference(_) => (
            StatusCode::BAD_GATEWAY,
            "情緒分析服務暫時無法使用，請稍後再試。",
            "inference_error",
        ),
        RecommendError::Catalog(CatalogError::Auth { .. }) => (
            StatusCode::BAD_GATEWAY,
            "音樂目錄授權失敗，請聯絡管理員檢查憑證設定。",
            "catalog_auth_error",
        ),
        RecommendError::Catalog(_) => (
            StatusCode::BAD_GATEWAY,
            "音樂目錄服務暫時無法使用，請稍後再試。",
            "catalog_error",
        ),
    }
}

async fn post_music(
    State(recommender): State<GuardedRecommender>,
    multipart: Multipart,
) -> Response {
    let submission = match read_submission(multipart).await {
        Ok(Some(submission)) => submission,
        Ok(None) => {
            return (
                StatusCode::BAD_REQUEST,
                Html(pages::error_page("請上傳圖片或輸入文字後再送出分析。")),
            )
                .into_response();
        }
        Err(message) => {
            metrics::record_recommendation("bad_request");
            return (StatusCode::BAD_REQUEST, Html(pages::error_page(&message))).into_response();
        }
    };

    let result = match &submission {
        Submission::Image { data, mime } => recommender.recommend_for_image(data, mime).await,
        Submission::Text(text) => recommender.recommend_for_text(text).await,
    };

    match result {
        Ok(recommendation) => {
            info!(
                tracks = recommendation.tracks.len(),
                "Recommendation rendered"
            );
            metrics::record_recommendation("ok");
            Html(pages::result_page(&recommendation)).into_response()
        }
        Err(err) => {
            error!(error = %err, "Recommendation pipeline failed");
            let (status, message, outcome) = error_response(&err);
            metrics::record_recommendation(outcome);
            (status, Html(pages::error_page(message))).into_response()
        }
    }
}

pub fn make_app(config: ServerConfig, recommender: Arc<Recommender>) -> Router {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        recommender,
        hash: env!("GIT_HASH").to_string(),
    };

    let home_router: Router<ServerState> = match &config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(home)),
    };

    let mut app: Router = home_router
        .route("/music", get(music_form).post(post_music))
        .route("/health", get(health))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state.clone());

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(super::slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state, log_requests));

    app
}

pub async fn run_server(config: ServerConfig, recommender: Arc<Recommender>) -> Result<()> {
    let port = config.port;
    let app = make_app(config, recommender);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);

    Ok(axum::serve(listener, app).await?)
}
