use crate::{fetch_json, GoogleAPIRequestFields, HttpsClient, YouTubeError};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Video,
    Channel,
}

impl SearchType {
    fn as_str(self) -> &'static str {
        match self {
            SearchType::Video => "video",
            SearchType::Channel => "channel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    Relevance,
    ViewCount,
    Date,
}

impl SearchOrder {
    fn as_str(self) -> &'static str {
        match self {
            SearchOrder::Relevance => "relevance",
            SearchOrder::ViewCount => "viewCount",
            SearchOrder::Date => "date",
        }
    }
}

/// A `search.list` call. Search results never carry statistics, so `send`
/// only yields the matched video or channel ids.
pub struct SearchRequest<'a> {
    pub client: &'a HttpsClient,
    pub base_url: &'a str,
    pub fields: GoogleAPIRequestFields<'a>,
    pub search_type: SearchType,
    pub query: Option<String>,
    pub channel_id: Option<String>,
    pub region_code: Option<String>,
    pub video_category_id: Option<String>,
    pub order: SearchOrder,
    pub max_results: u32,
}

impl<'a> AsMut<GoogleAPIRequestFields<'a>> for SearchRequest<'a> {
    fn as_mut(&mut self) -> &mut GoogleAPIRequestFields<'a> {
        &mut self.fields
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
    #[serde(rename = "channelId")]
    channel_id: Option<String>,
}

impl<'a> SearchRequest<'a> {
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn in_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn in_region(mut self, region_code: &str) -> Self {
        self.region_code = Some(region_code.to_string());
        self
    }

    pub fn in_category(mut self, category_id: impl Into<String>) -> Self {
        self.video_category_id = Some(category_id.into());
        self
    }

    pub fn order(mut self, order: SearchOrder) -> Self {
        self.order = order;
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub async fn send(self) -> Result<Vec<String>, YouTubeError> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("type", self.search_type.as_str().to_string()),
            ("order", self.order.as_str().to_string()),
            ("maxResults", self.max_results.to_string()),
        ];
        if let Some(query) = self.query {
            params.push(("q", query));
        }
        if let Some(channel_id) = self.channel_id {
            params.push(("channelId", channel_id));
        }
        if let Some(region_code) = self.region_code {
            params.push(("regionCode", region_code));
        }
        if let Some(category_id) = self.video_category_id {
            params.push(("videoCategoryId", category_id));
        }

        let api_response: ApiResponse = fetch_json(
            self.client,
            self.base_url,
            "search",
            &params,
            &self.fields,
            "items(id(videoId,channelId))",
        ).await?;

        let search_type = self.search_type;
        let ids = api_response.items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| match search_type {
                SearchType::Video => item.id.video_id,
                SearchType::Channel => item.id.channel_id,
            })
            .collect();

        Ok(ids)
    }
}
