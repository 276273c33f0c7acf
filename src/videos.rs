use crate::{fetch_json, GoogleAPIRequestFields, HttpsClient, YouTubeError};
use crate::models::Video;
use crate::utils::{format_duration, parse_count, parse_timestamp};
use serde::Deserialize;

pub enum VideoSelector {
    /// Explicit ids; results follow the order of the ids, missing ones are skipped.
    Ids(Vec<String>),
    /// The `mostPopular` chart for a region, optionally narrowed to one category.
    MostPopular {
        region_code: String,
        category_id: Option<String>,
    },
}

pub struct ListVideosRequest<'a> {
    pub client: &'a HttpsClient,
    pub base_url: &'a str,
    pub fields: GoogleAPIRequestFields<'a>,
    pub selector: VideoSelector,
    pub max_results: Option<u32>,
}

impl<'a> AsMut<GoogleAPIRequestFields<'a>> for ListVideosRequest<'a> {
    fn as_mut(&mut self) -> &mut GoogleAPIRequestFields<'a> {
        &mut self.fields
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    items: Option<Vec<ApiVideo>>
}

#[derive(Debug, Deserialize)]
struct ApiVideo {
    id: String,
    snippet: Option<VideoSnippet>,
    statistics: Option<VideoStatistics>,
    #[serde(rename = "contentDetails")]
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
    tags: Option<Vec<String>>,
    #[serde(rename = "categoryId")]
    category_id: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: Option<String>
}

#[derive(Debug, Deserialize)]
struct VideoStatistics {
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
    #[serde(rename = "likeCount")]
    like_count: Option<String>,
    #[serde(rename = "commentCount")]
    comment_count: Option<String>
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

impl From<ApiVideo> for Video {
    fn from(api_video: ApiVideo) -> Self {
        let snippet = api_video.snippet;
        let statistics = api_video.statistics.as_ref();

        let thumbnail = snippet
            .as_ref()
            .and_then(|s| s.thumbnails.as_ref())
            .and_then(|t| {
                [&t.medium, &t.high, &t.default]
                    .into_iter()
                    .flatten()
                    .find_map(|thumb| thumb.url.clone())
            });

        let duration = api_video.content_details
            .and_then(|c| c.duration)
            .map(|d| format_duration(&d))
            .unwrap_or_default();

        let published_at = parse_timestamp(snippet.as_ref().and_then(|s| s.published_at.as_ref()));

        let (title, channel_title, description, tags, category_id) = match snippet {
            Some(s) => (
                s.title.unwrap_or_default(),
                s.channel_title.unwrap_or_default(),
                s.description,
                s.tags.unwrap_or_default(),
                s.category_id,
            ),
            None => (String::new(), String::new(), None, Vec::new(), None),
        };

        Video {
            id: api_video.id,
            title,
            channel_title,
            view_count: parse_count(statistics.and_then(|s| s.view_count.as_ref())).unwrap_or(0),
            like_count: parse_count(statistics.and_then(|s| s.like_count.as_ref())),
            comment_count: parse_count(statistics.and_then(|s| s.comment_count.as_ref())),
            thumbnail,
            duration,
            published_at,
            description,
            tags,
            category_id,
        }
    }
}

impl<'a> ListVideosRequest<'a> {
    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub async fn send(self) -> Result<Vec<Video>, YouTubeError> {
        let mut params = vec![("part", "snippet,statistics,contentDetails".to_string())];

        match &self.selector {
            VideoSelector::Ids(video_ids) => {
                params.push(("id", video_ids.join(",")));
            }
            VideoSelector::MostPopular { region_code, category_id } => {
                params.push(("chart", "mostPopular".to_string()));
                params.push(("regionCode", region_code.clone()));
                if let Some(category_id) = category_id {
                    params.push(("videoCategoryId", category_id.clone()));
                }
            }
        }
        if let Some(max_results) = self.max_results {
            params.push(("maxResults", max_results.to_string()));
        }

        let api_response: ApiResponse = fetch_json(
            self.client,
            self.base_url,
            "videos",
            &params,
            &self.fields,
            "items(id,snippet(publishedAt,title,description,channelTitle,tags,categoryId,thumbnails),statistics(viewCount,likeCount,commentCount),contentDetails.duration)",
        ).await?;

        let mut items = api_response.items.unwrap_or_default();

        let videos = match self.selector {
            VideoSelector::MostPopular { .. } => items.into_iter().map(Video::from).collect(),
            VideoSelector::Ids(video_ids) => {
                let mut videos = Vec::with_capacity(video_ids.len());
                for video_id in video_ids {
                    if let Some(pos) = items.iter().position(|v| v.id == video_id) {
                        videos.push(Video::from(items.swap_remove(pos)));
                    }
                }
                videos
            }
        };

        Ok(videos)
    }
}
