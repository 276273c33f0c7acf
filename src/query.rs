use std::future::Future;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::envelope::{
    AdvisoryResult, CategoryTrendingResult, ChannelInfoResult, ChannelSummary, CommentBrief, CommentsResult,
    ComparisonResult, Envelope, Metadata, MusicHighlights, MusicTrends, MusicTrendsResult, RecentVideo,
    TimedVideoBrief, TrendingResult, TrendingVideo, VideoBrief, VideoInfoResult, VideoSummary, ViewershipStats,
};
use crate::models::Video;
use crate::search::SearchOrder;
use crate::statistics::StatisticsService;
use crate::utils::{format_count, total_count, truncate_chars};

/// Keyword to YouTube video category id. Order matters: the first keyword found wins.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("comedy", "23"),
    ("gaming", "20"),
    ("music", "10"),
    ("news", "25"),
    ("sports", "17"),
    ("entertainment", "24"),
    ("education", "27"),
];

pub const MUSIC_GENRES: &[&str] = &["gospel", "hip hop", "reggae", "gengetone", "afrobeat"];

const COMMENT_TEXT_LIMIT: usize = 200;
const DESCRIPTION_LIMIT: usize = 200;

static VIEWS_QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)how many views (does|do|has|for)").expect("valid pattern"));
static VIEWS_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)views").expect("valid pattern"));
static FILLER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)have|has|get|show me").expect("valid pattern"));
static COMPARE_WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)compare|vs|versus|and|channels?").expect("valid pattern"));
static NAME_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s]+").expect("valid pattern"));
static VIDEO_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z0-9_-]{11}").expect("valid pattern"));
static CHANNEL_QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)how many (views|subscribers|videos) (does|do|has)").expect("valid pattern"));
static CHANNEL_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)channel").expect("valid pattern"));
static CHANNEL_FILLER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)have|has|get|show me|about").expect("valid pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    VideoViews,
    Comparison,
    Comments,
    Category,
    MusicGenre,
    Channel,
    Default,
}

pub struct Rule {
    pub branch: Branch,
    /// Receives the lower-cased query.
    pub matches: fn(&str) -> bool,
}

pub const RULES: &[Rule] = &[
    Rule { branch: Branch::VideoViews, matches: |q| q.contains("views") || q.contains("how many") || q.contains("by ") },
    Rule { branch: Branch::Comparison, matches: |q| q.contains("compare") || q.contains("vs") },
    Rule { branch: Branch::Comments, matches: |q| q.contains("comment") },
    Rule { branch: Branch::Category, matches: |q| category_for(q).is_some() },
    Rule { branch: Branch::MusicGenre, matches: |q| q.contains("music") },
    Rule { branch: Branch::Channel, matches: |q| q.contains("channel") || q.contains("subscriber") },
    Rule { branch: Branch::Default, matches: |_| true },
];

/// Branches whose predicate accepts `query`, in evaluation order.
pub fn classify(query: &str) -> Vec<Branch> {
    let lower = query.to_lowercase();
    RULES
        .iter()
        .filter(|rule| (rule.matches)(&lower))
        .map(|rule| rule.branch)
        .collect()
}

pub fn category_for(lower: &str) -> Option<(&'static str, &'static str)> {
    CATEGORIES.iter().copied().find(|(keyword, _)| lower.contains(keyword))
}

pub fn genre_for(lower: &str) -> Option<&'static str> {
    MUSIC_GENRES.iter().copied().find(|genre| lower.contains(genre))
}

/// Search phrase for a "how many views" style question, pinned to Kenya.
pub fn views_search_term(query: &str) -> String {
    let stripped = strip_views_words(query);
    let stripped = FILLER.replace_all(&stripped, "");
    let mut term = stripped.trim().to_string();
    if !term.to_lowercase().contains("kenya") {
        term.push_str(" Kenya");
    }
    term.trim().to_string()
}

fn strip_views_words(query: &str) -> String {
    let stripped = VIEWS_QUESTION.replace_all(query, "");
    VIEWS_WORD.replace_all(&stripped, "").trim().to_string()
}

/// Candidate channel names in a comparison question. Tokens of two characters or fewer are dropped.
pub fn comparison_names(query: &str) -> Vec<String> {
    let stripped = COMPARE_WORDS.replace_all(query, "");
    NAME_SEPARATOR
        .split(&stripped)
        .filter(|name| name.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

pub fn channel_name(query: &str) -> String {
    let stripped = CHANNEL_QUESTION.replace_all(query, "");
    let stripped = CHANNEL_WORD.replace_all(&stripped, "");
    CHANNEL_FILLER.replace_all(&stripped, "").trim().to_string()
}

pub fn video_id_in(query: &str) -> Option<&str> {
    VIDEO_ID.find(query).map(|m| m.as_str())
}

/// Runs `evaluation` on its own task so that a panic inside a branch still
/// yields an error envelope for `query`.
pub(crate) async fn contain_failure<F>(query: &str, evaluation: F) -> Envelope
where
    F: Future<Output = Envelope> + Send + 'static,
{
    match tokio::spawn(evaluation).await {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::error!(query, error = %e, "query evaluation failed");
            Envelope::unexpected_failure(query, e.to_string())
        }
    }
}

fn summarize(video: &Video) -> VideoSummary {
    VideoSummary {
        title: video.title.clone(),
        channel: video.channel_title.clone(),
        views: format_count(video.view_count),
        views_raw: video.view_count.to_string(),
        likes: format_count(video.like_count.unwrap_or(0)),
        comments: format_count(video.comment_count.unwrap_or(0)),
        duration: video.duration.clone(),
        published_at: video.published_at,
    }
}

fn brief(video: &Video) -> VideoBrief {
    VideoBrief {
        title: video.title.clone(),
        channel: video.channel_title.clone(),
        views: format_count(video.view_count),
    }
}

fn timed_brief(video: &Video) -> TimedVideoBrief {
    TimedVideoBrief {
        title: video.title.clone(),
        channel: video.channel_title.clone(),
        views: format_count(video.view_count),
        duration: video.duration.clone(),
    }
}

impl StatisticsService {
    /// Answers a free-text question with a JSON envelope. Never fails.
    pub async fn get_youtube_statistics(&self, query: &str) -> String {
        self.answer(query).await.to_json()
    }

    pub async fn answer(&self, query: &str) -> Envelope {
        tracing::info!(query, "fetching YouTube statistics");

        if !self.has_api_key() {
            return Envelope::missing_api_key(query);
        }

        let service = self.clone();
        let owned_query = query.to_string();
        contain_failure(query, async move { service.evaluate_rules(&owned_query).await }).await
    }

    async fn evaluate_rules(&self, query: &str) -> Envelope {
        let lower = query.to_lowercase();

        for rule in RULES.iter().filter(|rule| (rule.matches)(&lower)) {
            if let Some(envelope) = self.run_branch(rule.branch, query, &lower).await {
                tracing::debug!(branch = ?rule.branch, "branch answered");
                return envelope;
            }
            tracing::debug!(branch = ?rule.branch, "branch declined");
        }

        // Default always answers, so this is only reached if the table loses it.
        self.trending_overview(query).await
    }

    pub async fn run_branch(&self, branch: Branch, query: &str, lower: &str) -> Option<Envelope> {
        match branch {
            Branch::VideoViews => self.video_views(query).await,
            Branch::Comparison => self.comparison(query).await,
            Branch::Comments => self.comments(query).await,
            Branch::Category => self.category_trending(query, lower).await,
            Branch::MusicGenre => Some(self.music_trends(query, lower).await),
            Branch::Channel => self.channel_info(query).await,
            Branch::Default => Some(self.trending_overview(query).await),
        }
    }

    async fn video_views(&self, query: &str) -> Option<Envelope> {
        let search_term = views_search_term(query);
        let videos = self.search_videos_by_keyword(&search_term, 5, SearchOrder::Relevance).await;

        if let Some(top) = videos.first() {
            return Some(Envelope::VideoInfo(VideoInfoResult {
                video_info: summarize(top),
                other_results: Some(videos.iter().skip(1).take(3).map(brief).collect()),
                note: None,
                search_term: Some(search_term),
                meta: Metadata::live(query),
            }));
        }

        let fallback_term = strip_views_words(query);
        let fallback = self.search_videos_worldwide(&fallback_term, 5, SearchOrder::Relevance).await;
        let top = fallback.first()?;

        Some(Envelope::VideoInfo(VideoInfoResult {
            video_info: summarize(top),
            other_results: None,
            note: Some("Result may not be from Kenya".to_string()),
            search_term: None,
            meta: Metadata::live(query),
        }))
    }

    async fn comparison(&self, query: &str) -> Option<Envelope> {
        let names = comparison_names(query);
        if names.len() < 2 {
            return None;
        }

        let mut channel_ids = Vec::with_capacity(names.len());
        for name in &names {
            if let Some(channel) = self.search_channel_by_name(name).await {
                channel_ids.push(channel.id);
            }
        }
        if channel_ids.len() < 2 {
            tracing::debug!(resolved = channel_ids.len(), "not enough channels to compare");
            return None;
        }

        let comparison = self.compare_channels(&channel_ids).await?;
        Some(Envelope::Comparison(ComparisonResult { comparison, meta: Metadata::live(query) }))
    }

    async fn comments(&self, query: &str) -> Option<Envelope> {
        let video_id = video_id_in(query)?;
        let comments = self.video_comments(video_id, 20).await;

        Some(Envelope::Comments(CommentsResult {
            comments: comments
                .iter()
                .take(10)
                .map(|c| CommentBrief {
                    author: c.author.clone(),
                    text: truncate_chars(&c.text, COMMENT_TEXT_LIMIT),
                    likes: format_count(c.like_count),
                })
                .collect(),
            total_comments: comments.len(),
            meta: Metadata::live(query),
        }))
    }

    async fn category_trending(&self, query: &str, lower: &str) -> Option<Envelope> {
        let (category, category_id) = category_for(lower)?;
        let videos = self.trending_by_category(category_id, 10).await;

        Some(Envelope::CategoryTrending(CategoryTrendingResult {
            category: category.to_string(),
            trending_videos: videos.iter().take(5).map(timed_brief).collect(),
            meta: Metadata::live(query),
        }))
    }

    async fn music_trends(&self, query: &str, lower: &str) -> Envelope {
        let genre = genre_for(lower);
        let videos = self.search_kenyan_music(genre, 10).await;

        Envelope::MusicTrends(MusicTrendsResult {
            music_trends: MusicTrends {
                genre: genre.unwrap_or("general").to_string(),
                top_videos: videos.iter().take(5).map(timed_brief).collect(),
            },
            meta: Metadata::live(query),
        })
    }

    async fn channel_info(&self, query: &str) -> Option<Envelope> {
        let name = channel_name(query);
        let channel = self.search_channel_by_name(&name).await?;
        let recent_videos = self.channel_videos(&channel.id, 5).await;

        Some(Envelope::ChannelInfo(ChannelInfoResult {
            channel_info: ChannelSummary {
                name: channel.title.clone(),
                id: channel.id.clone(),
                subscribers: format_count(channel.subscriber_count),
                total_views: format_count(channel.view_count),
                video_count: channel.video_count.to_string(),
                description: channel.description.as_deref().map(|d| truncate_chars(d, DESCRIPTION_LIMIT)),
            },
            recent_videos: recent_videos
                .iter()
                .map(|v| RecentVideo {
                    title: v.title.clone(),
                    views: format_count(v.view_count),
                    duration: v.duration.clone(),
                })
                .collect(),
            meta: Metadata::live(query),
        }))
    }

    async fn trending_overview(&self, query: &str) -> Envelope {
        let (trending, music) = tokio::join!(
            self.trending_videos(10),
            self.search_kenyan_music(None, 5),
        );

        if trending.is_empty() && music.is_empty() {
            return Envelope::Advisory(AdvisoryResult {
                message: "YouTube API quota reached or access restricted. Try searching for specific content instead."
                    .to_string(),
                suggestion: "Search for specific Kenyan artists, songs, or channels to get results.".to_string(),
                meta: Metadata {
                    region_code: Some(crate::envelope::REGION_LABEL),
                    ..Metadata::offline(query)
                },
            });
        }

        let total_views = total_count(trending.iter().map(|v| v.view_count));

        Envelope::Trending(TrendingResult {
            trending_videos: (!trending.is_empty()).then(|| {
                trending
                    .iter()
                    .take(5)
                    .map(|v| TrendingVideo {
                        id: v.id.clone(),
                        title: v.title.clone(),
                        channel: v.channel_title.clone(),
                        views: format_count(v.view_count),
                        likes: format_count(v.like_count.unwrap_or(0)),
                        duration: v.duration.clone(),
                    })
                    .collect()
            }),
            music_trends: (!music.is_empty()).then(|| MusicHighlights {
                top_videos: music.iter().take(3).map(brief).collect(),
            }),
            viewership_stats: ViewershipStats {
                total_trending_views: format_count(total_views),
                trending_videos_count: trending.len(),
                music_videos_found: music.len(),
            },
            meta: Metadata::live_in_region(query),
        })
    }
}
