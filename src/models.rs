use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    /// 11-character YouTube video id, kept exactly as the API returned it.
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub view_count: u64,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub thumbnail: Option<String>,
    /// Already passed through `format_duration`.
    pub duration: String,
    pub published_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub subscriber_count: u64,
    pub view_count: u64,
    pub video_count: u64,
    pub description: Option<String>,
    pub custom_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub like_count: u64,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedChannel {
    pub name: String,
    pub subscribers: String,
    pub subscriber_count: u64,
    pub views: String,
    pub videos: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelComparison {
    pub channels: Vec<ComparedChannel>,
    pub winner: String,
}
