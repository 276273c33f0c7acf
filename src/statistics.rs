use crate::config::Config;
use crate::models::{Channel, ChannelComparison, Comment, ComparedChannel, Video};
use crate::search::{SearchOrder, SearchType};
use crate::utils::format_count;
use crate::{initialize_client, ClientError, GoogleAPIRequest, YouTubeDataV3Client, YouTubeError, REGION_CODE};

const MUSIC_CATEGORY_ID: &str = "10";

#[derive(Clone)]
pub struct StatisticsService {
    youtube: YouTubeDataV3Client,
    api_key: Option<String>,
}

fn or_empty<T: Default>(pipeline: &str, result: Result<T, YouTubeError>) -> T {
    match result {
        Ok(value) => value,
        Err(YouTubeError::CommentsDisabled) => {
            tracing::warn!(pipeline, "comments are disabled for this video");
            T::default()
        }
        Err(e) => {
            tracing::warn!(pipeline, error = %e, "YouTube request failed, returning empty result");
            T::default()
        }
    }
}

impl StatisticsService {
    pub fn new(youtube: YouTubeDataV3Client, api_key: Option<String>) -> Self {
        StatisticsService {
            youtube,
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let client = initialize_client()?;
        let youtube = YouTubeDataV3Client::new(config.youtube_api_base.clone(), client);
        Ok(Self::new(youtube, config.youtube_api_key.clone()))
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetches full records for `ids` in one batched call. An empty id list
    /// means the search step found nothing, so no request is made.
    async fn videos_by_ids(&self, key: &str, ids: Vec<String>) -> Result<Vec<Video>, YouTubeError> {
        if ids.is_empty() {
            tracing::debug!("search returned no video ids");
            return Ok(Vec::new());
        }
        self.youtube.list_videos(ids).with_key(key).send().await
    }

    pub async fn trending_videos(&self, max_results: u32) -> Vec<Video> {
        let Some(key) = self.api_key.as_deref() else { return Vec::new() };

        let result = self.youtube
            .most_popular_videos(REGION_CODE, None)
            .max_results(max_results)
            .with_key(key)
            .send()
            .await;
        or_empty("trending_videos", result)
    }

    async fn search_videos(
        &self,
        keyword: &str,
        max_results: u32,
        order: SearchOrder,
        region_code: Option<&str>,
    ) -> Result<Vec<Video>, YouTubeError> {
        let Some(key) = self.api_key.as_deref() else { return Ok(Vec::new()) };

        let mut search = self.youtube
            .search(SearchType::Video)
            .query(keyword)
            .order(order)
            .max_results(max_results);
        if let Some(region_code) = region_code {
            search = search.in_region(region_code);
        }

        let ids = search.with_key(key).send().await?;
        self.videos_by_ids(key, ids).await
    }

    pub async fn search_videos_by_keyword(&self, keyword: &str, max_results: u32, order: SearchOrder) -> Vec<Video> {
        let result = self.search_videos(keyword, max_results, order, Some(REGION_CODE)).await;
        or_empty("search_videos_by_keyword", result)
    }

    /// Same as [`Self::search_videos_by_keyword`] without the Kenya region constraint.
    pub async fn search_videos_worldwide(&self, keyword: &str, max_results: u32, order: SearchOrder) -> Vec<Video> {
        let result = self.search_videos(keyword, max_results, order, None).await;
        or_empty("search_videos_worldwide", result)
    }

    pub async fn video_details(&self, video_id: &str) -> Option<Video> {
        let key = self.api_key.as_deref()?;

        let result = self.youtube
            .list_videos(vec![video_id.to_string()])
            .with_key(key)
            .send()
            .await;
        or_empty("video_details", result).into_iter().next()
    }

    pub async fn search_channel_by_name(&self, channel_name: &str) -> Option<Channel> {
        let key = self.api_key.as_deref()?;

        let result = async {
            let ids = self.youtube
                .search(SearchType::Channel)
                .query(channel_name)
                .max_results(1)
                .with_key(key)
                .send()
                .await?;

            let Some(channel_id) = ids.into_iter().next() else {
                tracing::debug!(channel_name, "no channel matched");
                return Ok(Vec::new());
            };

            self.youtube.list_channels(vec![channel_id]).with_key(key).send().await
        }.await;

        or_empty("search_channel_by_name", result).into_iter().next()
    }

    /// Most recent uploads of a channel.
    pub async fn channel_videos(&self, channel_id: &str, max_results: u32) -> Vec<Video> {
        let Some(key) = self.api_key.as_deref() else { return Vec::new() };

        let result = async {
            let ids = self.youtube
                .search(SearchType::Video)
                .in_channel(channel_id)
                .order(SearchOrder::Date)
                .max_results(max_results)
                .with_key(key)
                .send()
                .await?;
            self.videos_by_ids(key, ids).await
        }.await;

        or_empty("channel_videos", result)
    }

    pub async fn video_comments(&self, video_id: &str, max_results: u32) -> Vec<Comment> {
        let Some(key) = self.api_key.as_deref() else { return Vec::new() };

        let result = self.youtube
            .list_comment_threads(video_id.to_string(), max_results)
            .with_key(key)
            .send()
            .await;
        or_empty("video_comments", result)
    }

    /// Kenyan channels, largest audience first.
    pub async fn popular_kenyan_channels(&self, max_results: u32) -> Vec<Channel> {
        let Some(key) = self.api_key.as_deref() else { return Vec::new() };

        let result = async {
            let ids = self.youtube
                .search(SearchType::Channel)
                .query("Kenya")
                .in_region(REGION_CODE)
                .order(SearchOrder::Relevance)
                .max_results(max_results)
                .with_key(key)
                .send()
                .await?;
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            self.youtube.list_channels(ids).with_key(key).send().await
        }.await;

        let mut channels = or_empty("popular_kenyan_channels", result);
        channels.sort_by(|a, b| b.subscriber_count.cmp(&a.subscriber_count));
        channels
    }

    pub async fn search_kenyan_music(&self, genre: Option<&str>, max_results: u32) -> Vec<Video> {
        let Some(key) = self.api_key.as_deref() else { return Vec::new() };

        let query = match genre {
            Some(genre) => format!("{} music Kenya", genre),
            None => "Kenyan music".to_string(),
        };

        let result = async {
            let ids = self.youtube
                .search(SearchType::Video)
                .query(query)
                .in_category(MUSIC_CATEGORY_ID)
                .in_region(REGION_CODE)
                .order(SearchOrder::ViewCount)
                .max_results(max_results)
                .with_key(key)
                .send()
                .await?;
            self.videos_by_ids(key, ids).await
        }.await;

        or_empty("search_kenyan_music", result)
    }

    /// Fetches all channels in one call and names the one with the most
    /// subscribers. Ties go to the channel the API listed first.
    pub async fn compare_channels(&self, channel_ids: &[String]) -> Option<ChannelComparison> {
        let key = self.api_key.as_deref()?;

        let result = self.youtube
            .list_channels(channel_ids.to_vec())
            .with_key(key)
            .send()
            .await;
        let channels = or_empty("compare_channels", result);

        let winner = channels
            .iter()
            .reduce(|best, current| {
                if current.subscriber_count > best.subscriber_count { current } else { best }
            })?
            .title
            .clone();

        Some(ChannelComparison {
            channels: channels
                .iter()
                .map(|c| ComparedChannel {
                    name: c.title.clone(),
                    subscribers: format_count(c.subscriber_count),
                    subscriber_count: c.subscriber_count,
                    views: format_count(c.view_count),
                    videos: c.video_count.to_string(),
                })
                .collect(),
            winner,
        })
    }

    pub async fn trending_by_category(&self, category_id: &str, max_results: u32) -> Vec<Video> {
        let Some(key) = self.api_key.as_deref() else { return Vec::new() };

        let result = self.youtube
            .most_popular_videos(REGION_CODE, Some(category_id.to_string()))
            .max_results(max_results)
            .with_key(key)
            .send()
            .await;
        or_empty("trending_by_category", result)
    }

    /// Most viewed Kenyan videos for a free-text genre, used by the genre aggregate.
    pub async fn genre_videos(&self, genre: &str) -> Vec<Video> {
        let result = self.search_videos(genre, 20, SearchOrder::ViewCount, Some(REGION_CODE)).await;
        or_empty("genre_videos", result)
    }
}
