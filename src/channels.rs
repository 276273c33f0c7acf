use crate::{fetch_json, GoogleAPIRequestFields, HttpsClient, YouTubeError};
use crate::models::*;
use crate::utils::{parse_count, parse_timestamp};
use serde::Deserialize;

pub struct ListChannelsRequest<'a> {
    pub client: &'a HttpsClient,
    pub base_url: &'a str,
    pub fields: GoogleAPIRequestFields<'a>,
    pub channel_ids: Vec<String>,
}

impl<'a> AsMut<GoogleAPIRequestFields<'a>> for ListChannelsRequest<'a> {
    fn as_mut(&mut self) -> &mut GoogleAPIRequestFields<'a> {
        &mut self.fields
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    items: Option<Vec<ApiChannel>>
}

#[derive(Debug, Deserialize)]
struct ApiChannel {
    id: String,
    snippet: Option<ChannelSnippet>,
    statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "customUrl")]
    custom_url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    country: Option<String>
}

#[derive(Debug, Deserialize)]
struct ChannelStatistics {
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
    #[serde(rename = "subscriberCount")]
    subscriber_count: Option<String>,
    #[serde(rename = "videoCount")]
    video_count: Option<String>
}

impl<'a> ListChannelsRequest<'a> {

    /// Channels come back in the API's order; ids it does not know are absent.
    pub async fn send(self) -> Result<Vec<Channel>, YouTubeError> {

        let params = [
            ("part", "snippet,statistics".to_string()),
            ("id", self.channel_ids.join(",")),
        ];

        let api_response: ApiResponse = fetch_json(
            self.client,
            self.base_url,
            "channels",
            &params,
            &self.fields,
            "items(id,snippet(title,description,customUrl,publishedAt,country),statistics(subscriberCount,viewCount,videoCount))",
        ).await?;

        let channels: Vec<Channel> = api_response.items
            .unwrap_or_default()
            .into_iter()
            .map(|channel| {
                let statistics = channel.statistics.as_ref();

                Channel {
                    published_at: parse_timestamp(channel.snippet.as_ref().and_then(|s| s.published_at.as_ref())),
                    subscriber_count: parse_count(statistics.and_then(|s| s.subscriber_count.as_ref())).unwrap_or_default(),
                    view_count: parse_count(statistics.and_then(|s| s.view_count.as_ref())).unwrap_or_default(),
                    video_count: parse_count(statistics.and_then(|s| s.video_count.as_ref())).unwrap_or_default(),
                    title: channel.snippet.as_ref().and_then(|s| s.title.clone()).unwrap_or_default(),
                    description: channel.snippet.as_ref().and_then(|s| s.description.clone()),
                    custom_url: channel.snippet.as_ref().and_then(|s| s.custom_url.clone()),
                    country: channel.snippet.as_ref().and_then(|s| s.country.clone()),
                    id: channel.id,
                }
            })
            .collect();

        Ok(channels)

    }
}
