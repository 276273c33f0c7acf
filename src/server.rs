use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::narration::{GeminiNarrator, Narrator};
use crate::statistics::StatisticsService;
use crate::utils::{format_count, total_count};
use crate::ClientError;

const DEFAULT_QUESTION: &str = "Get current YouTube statistics for Kenya";
const DEFAULT_GENRE: &str = "Kenyan content";

pub struct AppState {
    pub stats: StatisticsService,
    pub narrator: Arc<dyn Narrator>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let stats = StatisticsService::from_config(config)?;
        let narrator = GeminiNarrator::from_config(config, stats.clone())?;
        Ok(AppState { stats, narrator: Arc::from(narrator) })
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to fetch YouTube statistics")]
    Statistics(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self, "request failed");
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    q: Option<String>,
}

impl StatsParams {
    fn question(self) -> String {
        self.q.filter(|q| !q.trim().is_empty()).unwrap_or_else(|| DEFAULT_QUESTION.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct GenreParams {
    genre: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreVideo {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub view_count: String,
    pub view_count_raw: u64,
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_count: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreStats {
    pub total_videos: usize,
    pub total_views: String,
    pub top_channels: Vec<String>,
    pub videos: Vec<GenreVideo>,
}

async fn youtube_direct(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<Value>, ApiError> {
    let question = params.question();
    let stats = state.stats.get_youtube_statistics(&question).await;
    Ok(Json(serde_json::from_str(&stats)?))
}

async fn youtube_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<Value>, ApiError> {
    let question = params.question();

    let (stats, narration) = tokio::join!(
        state.stats.get_youtube_statistics(&question),
        state.narrator.narrate(&question),
    );

    let ai_answer = narration.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "narration failed, continuing with stats only");
        String::new()
    });

    let mut body = serde_json::Map::new();
    body.insert("aiAnswer".to_string(), Value::String(ai_answer));
    if let Value::Object(stats) = serde_json::from_str::<Value>(&stats)? {
        body.extend(stats);
    }

    Ok(Json(Value::Object(body)))
}

async fn genre_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GenreParams>,
) -> Json<GenreStats> {
    let genre = params
        .genre
        .filter(|g| !g.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GENRE.to_string());

    let videos = state.stats.genre_videos(&genre).await;

    let mut top_channels: Vec<String> = Vec::new();
    for video in &videos {
        if !top_channels.contains(&video.channel_title) {
            top_channels.push(video.channel_title.clone());
        }
    }
    top_channels.truncate(10);

    let total_views = total_count(videos.iter().map(|v| v.view_count));

    Json(GenreStats {
        total_videos: videos.len(),
        total_views: format_count(total_views),
        top_channels,
        videos: videos
            .into_iter()
            .take(10)
            .map(|v| GenreVideo {
                view_count: format_count(v.view_count),
                view_count_raw: v.view_count,
                like_count: v.like_count.map(format_count),
                id: v.id,
                title: v.title,
                channel_title: v.channel_title,
                thumbnail: v.thumbnail,
                published_at: v.published_at,
            })
            .collect(),
    })
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/youtube-direct", get(youtube_direct))
        .route("/youtube-stats", get(youtube_stats))
        .route("/genre-stats", get(genre_stats))
        .with_state(state)
}
