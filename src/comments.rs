use crate::{fetch_json, GoogleAPIRequestFields, HttpsClient, YouTubeError};
use crate::models::Comment;
use crate::utils::parse_timestamp;
use serde::Deserialize;

/// Top-level comment threads of one video, most relevant first.
pub struct ListCommentThreadsRequest<'a> {
    pub client: &'a HttpsClient,
    pub base_url: &'a str,
    pub fields: GoogleAPIRequestFields<'a>,
    pub video_id: String,
    pub max_results: u32,
}

impl<'a> AsMut<GoogleAPIRequestFields<'a>> for ListCommentThreadsRequest<'a> {
    fn as_mut(&mut self) -> &mut GoogleAPIRequestFields<'a> {
        &mut self.fields
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    items: Option<Vec<ThreadItem>>,
}

#[derive(Debug, Deserialize)]
struct ThreadItem {
    id: String,
    snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
struct ThreadSnippet {
    #[serde(rename = "topLevelComment")]
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
struct CommentSnippet {
    #[serde(rename = "authorDisplayName")]
    author_display_name: Option<String>,
    #[serde(rename = "textDisplay")]
    text_display: Option<String>,
    #[serde(rename = "likeCount")]
    like_count: Option<u64>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

impl<'a> ListCommentThreadsRequest<'a> {
    pub async fn send(self) -> Result<Vec<Comment>, YouTubeError> {
        let params = [
            ("part", "snippet".to_string()),
            ("videoId", self.video_id),
            ("maxResults", self.max_results.to_string()),
            ("order", "relevance".to_string()),
            ("textFormat", "plainText".to_string()),
        ];

        let api_response: ApiResponse = fetch_json(
            self.client,
            self.base_url,
            "commentThreads",
            &params,
            &self.fields,
            "items(id,snippet.topLevelComment.snippet(authorDisplayName,textDisplay,likeCount,publishedAt))",
        ).await?;

        let comments = api_response.items
            .unwrap_or_default()
            .into_iter()
            .map(|thread| {
                let snippet = thread.snippet.top_level_comment.snippet;
                Comment {
                    id: thread.id,
                    published_at: parse_timestamp(snippet.published_at.as_ref()),
                    author: snippet.author_display_name.unwrap_or_default(),
                    text: snippet.text_display.unwrap_or_default(),
                    like_count: snippet.like_count.unwrap_or_default(),
                }
            })
            .collect();

        Ok(comments)
    }
}
