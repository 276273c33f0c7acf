use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::models::ChannelComparison;

pub const DATA_SOURCE_LIVE: &str = "YouTube Data API v3 (Real-time)";
pub const DATA_SOURCE: &str = "YouTube Data API v3";
pub const REGION_LABEL: &str = "KE (Kenya)";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub data_source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_code: Option<&'static str>,
    pub query: String,
}

impl Metadata {
    pub fn live(query: &str) -> Self {
        Metadata { data_source: DATA_SOURCE_LIVE, region_code: None, query: query.to_string() }
    }

    pub fn live_in_region(query: &str) -> Self {
        Metadata { data_source: DATA_SOURCE_LIVE, region_code: Some(REGION_LABEL), query: query.to_string() }
    }

    pub fn offline(query: &str) -> Self {
        Metadata { data_source: DATA_SOURCE, region_code: None, query: query.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub title: String,
    pub channel: String,
    pub views: String,
    pub views_raw: String,
    pub likes: String,
    pub comments: String,
    pub duration: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoBrief {
    pub title: String,
    pub channel: String,
    pub views: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedVideoBrief {
    pub title: String,
    pub channel: String,
    pub views: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfoResult {
    pub video_info: VideoSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_results: Option<Vec<VideoBrief>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(flatten)]
    pub meta: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub comparison: ChannelComparison,
    #[serde(flatten)]
    pub meta: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentBrief {
    pub author: String,
    pub text: String,
    pub likes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsResult {
    pub comments: Vec<CommentBrief>,
    pub total_comments: usize,
    #[serde(flatten)]
    pub meta: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTrendingResult {
    pub category: String,
    pub trending_videos: Vec<TimedVideoBrief>,
    #[serde(flatten)]
    pub meta: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicTrends {
    pub genre: String,
    pub top_videos: Vec<TimedVideoBrief>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicTrendsResult {
    pub music_trends: MusicTrends,
    #[serde(flatten)]
    pub meta: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub name: String,
    pub id: String,
    pub subscribers: String,
    pub total_views: String,
    pub video_count: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentVideo {
    pub title: String,
    pub views: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfoResult {
    pub channel_info: ChannelSummary,
    pub recent_videos: Vec<RecentVideo>,
    #[serde(flatten)]
    pub meta: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingVideo {
    pub id: String,
    pub title: String,
    pub channel: String,
    pub views: String,
    pub likes: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicHighlights {
    pub top_videos: Vec<VideoBrief>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewershipStats {
    pub total_trending_views: String,
    pub trending_videos_count: usize,
    pub music_videos_found: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trending_videos: Option<Vec<TrendingVideo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_trends: Option<MusicHighlights>,
    pub viewership_stats: ViewershipStats,
    #[serde(flatten)]
    pub meta: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisoryResult {
    pub message: String,
    pub suggestion: String,
    #[serde(flatten)]
    pub meta: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResult {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(flatten)]
    pub meta: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    VideoInfo(VideoInfoResult),
    Comparison(ComparisonResult),
    Comments(CommentsResult),
    CategoryTrending(CategoryTrendingResult),
    MusicTrends(MusicTrendsResult),
    ChannelInfo(ChannelInfoResult),
    Trending(TrendingResult),
    Advisory(AdvisoryResult),
    Error(ErrorResult),
}

impl Envelope {
    pub fn missing_api_key(query: &str) -> Self {
        Envelope::Error(ErrorResult {
            error: "YouTube API key not configured".to_string(),
            message: "Please add YOUTUBE_API_KEY to your .env file.".to_string(),
            suggestion: None,
            meta: Metadata::offline(query),
        })
    }

    pub fn unexpected_failure(query: &str, message: impl Into<String>) -> Self {
        Envelope::Error(ErrorResult {
            error: "Failed to fetch YouTube data".to_string(),
            message: message.into(),
            suggestion: Some(
                "The YouTube API may have rate limits or quota restrictions. Try searching for specific content or try again later."
                    .to_string(),
            ),
            meta: Metadata::offline(query),
        })
    }

    pub fn meta(&self) -> &Metadata {
        match self {
            Envelope::VideoInfo(r) => &r.meta,
            Envelope::Comparison(r) => &r.meta,
            Envelope::Comments(r) => &r.meta,
            Envelope::CategoryTrending(r) => &r.meta,
            Envelope::MusicTrends(r) => &r.meta,
            Envelope::ChannelInfo(r) => &r.meta,
            Envelope::Trending(r) => &r.meta,
            Envelope::Advisory(r) => &r.meta,
            Envelope::Error(r) => &r.meta,
        }
    }

    /// Pretty-printed JSON, the form handed to routes and to the narrator's tool.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize envelope");
            json!({
                "error": "Failed to fetch YouTube data",
                "message": e.to_string(),
                "dataSource": DATA_SOURCE,
                "query": self.meta().query,
            })
            .to_string()
        })
    }
}
