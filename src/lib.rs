use std::error::Error;
use hyper::body::Bytes;
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use http_body_util::{BodyExt, Empty, Full};
use hyper::{Method, Request, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use native_tls::TlsConnector;
use hyper_util::rt::TokioExecutor;
use url::Url;


pub mod config;
pub use config::Config;
pub mod models;
pub mod utils;
pub mod search;
pub use search::{SearchOrder, SearchRequest, SearchType};
pub mod videos;
pub use videos::{ListVideosRequest, VideoSelector};
pub mod channels;
pub use channels::ListChannelsRequest;
pub mod comments;
pub use comments::ListCommentThreadsRequest;
pub mod statistics;
pub use statistics::StatisticsService;
pub mod envelope;
pub use envelope::Envelope;
pub mod query;
pub use query::{Branch, Rule, RULES};
pub mod narration;
pub use narration::{DisabledNarrator, GeminiNarrator, NarrationError, Narrator};
pub mod server;
pub use server::{create_router, AppState};

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Every search and chart request is pinned to Kenya.
pub const REGION_CODE: &str = "KE";

pub type HttpsClient = Client<HttpsConnector<HttpConnector>, Empty<Bytes>>;
pub type HttpsFullClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    NetworkError(#[from] std::io::Error),
    #[error("TLS error: {0}")]
    TlsError(#[from] native_tls::Error),
}

fn https_connector() -> Result<HttpsConnector<HttpConnector>, ClientError> {
    let mut http = HttpConnector::new();
    // plain http stays allowed so a local API stand-in can be targeted
    http.enforce_http(false);

    let tls = TlsConnector::builder().build()?;

    Ok(HttpsConnector::from((http, tls.into())))
}

pub fn initialize_client() -> Result<HttpsClient, ClientError> {
    let https = https_connector()?;

    let client = Client::builder(TokioExecutor::new())
        .build::<_, Empty<Bytes>>(https);

    Ok(client)
}

pub fn initialize_full_client() -> Result<HttpsFullClient, ClientError> {
    let https = https_connector()?;

    let client = Client::builder(TokioExecutor::new())
        .build::<_, Full<Bytes>>(https);

    Ok(client)
}

pub struct GoogleAPIRequestFields<'a> {
    pub key: Option<&'a str>,
}

impl<'a> GoogleAPIRequestFields<'a> {
    pub fn empty() -> Self {
        GoogleAPIRequestFields {
            key: None,
        }
    }
}

pub trait GoogleAPIRequest<'a> {
    fn key(&mut self) -> &mut Option<&'a str>;

    fn with_key(mut self, key: &'a str) -> Self
    where
        Self: Sized,
    {
        *self.key() = Some(key);
        self
    }
}

impl<'a, T> GoogleAPIRequest<'a> for T
where
    T: AsMut<GoogleAPIRequestFields<'a>>,
{
    fn key(&mut self) -> &mut Option<&'a str> {
        &mut self.as_mut().key
    }
}

#[derive(Error, Debug)]
pub enum YouTubeError {
    #[error("Not found")]
    NotFound,
    #[error("Ratelimited")]
    Ratelimited,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Comments disabled")] // commentThreads specific
    CommentsDisabled,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal server error")]
    InternalServerError,
    #[error("Unknown status code: {0}")]
    UnknownStatusCode(StatusCode),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("HTTP error: {0}")]
    HttpError(#[from] hyper::Error),
    #[error("Legacy HTTP error: {0}")]
    LegacyHttpError(#[from] hyper_util::client::legacy::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Other error: {0}")]
    Other(Box<dyn Error + Send + Sync>),
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    reason: Option<String>,
}

const QUOTA_EXCEEDED_PREFIX: &str = "The request cannot be completed because you have exceeded your";

/// Sends a GET to `{base_url}/{resource}` with `params`, attaching the key
/// carried in `fields`, and decodes a 200 body into `T`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    client: &HttpsClient,
    base_url: &str,
    resource: &str,
    params: &[(&str, String)],
    fields: &GoogleAPIRequestFields<'_>,
    field_mask: &str,
) -> Result<T, YouTubeError> {
    let mut url = Url::parse(&format!("{}/{}", base_url.trim_end_matches('/'), resource))?;
    {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in params {
            pairs.append_pair(name, value);
        }
        if let Some(key) = fields.key {
            pairs.append_pair("key", key);
        }
    }

    let req = Request::builder()
        .method(Method::GET)
        .uri(url.as_str())
        .header("X-Goog-Fieldmask", field_mask)
        .body(Empty::new())
        .map_err(|e| YouTubeError::Other(Box::new(e)))?;

    let resp = client.request(req).await?;

    match resp.status() {
        StatusCode::OK => (),
        StatusCode::TOO_MANY_REQUESTS => return Err(YouTubeError::Ratelimited),
        StatusCode::FORBIDDEN => {
            let body_bytes = resp.into_body().collect().await?.to_bytes();
            match serde_json::from_slice::<ErrorResponse>(&body_bytes) {
                Ok(error_response) => {
                    let reasons: Vec<&str> = error_response.error.errors
                        .iter()
                        .filter_map(|e| e.reason.as_deref())
                        .collect();

                    if reasons.contains(&"commentsDisabled") {
                        return Err(YouTubeError::CommentsDisabled);
                    }
                    if reasons.contains(&"quotaExceeded")
                        || error_response.error.message.starts_with(QUOTA_EXCEEDED_PREFIX)
                    {
                        return Err(YouTubeError::Ratelimited);
                    }

                    tracing::warn!(message = %error_response.error.message, "unknown forbidden error message");
                    return Err(YouTubeError::Forbidden);
                },
                Err(e) => {
                    let body_str = String::from_utf8_lossy(&body_bytes);
                    tracing::warn!(error = %e, body = %body_str, "failed to parse error response");
                    return Err(YouTubeError::Forbidden);
                }
            }
        },
        StatusCode::BAD_REQUEST => {
            let body_bytes = resp.into_body().collect().await?.to_bytes();
            let message = serde_json::from_slice::<ErrorResponse>(&body_bytes)
                .map(|r| r.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body_bytes).into_owned());
            return Err(YouTubeError::BadRequest(message));
        },
        StatusCode::NOT_FOUND => return Err(YouTubeError::NotFound),
        StatusCode::UNAUTHORIZED => return Err(YouTubeError::Unauthorized),
        StatusCode::INTERNAL_SERVER_ERROR | StatusCode::SERVICE_UNAVAILABLE => {
            return Err(YouTubeError::InternalServerError)
        },
        status => {
            let body_bytes = resp.into_body().collect().await?.to_bytes();
            let body_str = String::from_utf8_lossy(&body_bytes);
            tracing::warn!(status = status.as_u16(), body = %body_str, "unknown status code");
            return Err(YouTubeError::UnknownStatusCode(status));
        },
    };

    let body_bytes = resp.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&body_bytes)?)
}

#[derive(Clone)]
pub struct YouTubeDataV3Client {
    client: HttpsClient,
    base_url: String,
}

impl YouTubeDataV3Client {
    pub fn new(base_url: impl Into<String>, client: HttpsClient) -> Self {
        YouTubeDataV3Client {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn search(&self, search_type: SearchType) -> SearchRequest<'_> {
        SearchRequest {
            client: &self.client,
            base_url: &self.base_url,
            fields: GoogleAPIRequestFields::empty(),
            search_type,
            query: None,
            channel_id: None,
            region_code: None,
            video_category_id: None,
            order: SearchOrder::Relevance,
            max_results: 10,
        }
    }

    pub fn list_videos(&self, video_ids: Vec<String>) -> ListVideosRequest<'_> {
        ListVideosRequest {
            client: &self.client,
            base_url: &self.base_url,
            fields: GoogleAPIRequestFields::empty(),
            selector: VideoSelector::Ids(video_ids),
            max_results: None,
        }
    }

    pub fn most_popular_videos(&self, region_code: &str, category_id: Option<String>) -> ListVideosRequest<'_> {
        ListVideosRequest {
            client: &self.client,
            base_url: &self.base_url,
            fields: GoogleAPIRequestFields::empty(),
            selector: VideoSelector::MostPopular {
                region_code: region_code.to_string(),
                category_id,
            },
            max_results: None,
        }
    }

    pub fn list_channels(&self, channel_ids: Vec<String>) -> ListChannelsRequest<'_> {
        ListChannelsRequest {
            client: &self.client,
            base_url: &self.base_url,
            fields: GoogleAPIRequestFields::empty(),
            channel_ids,
        }
    }

    pub fn list_comment_threads(&self, video_id: String, max_results: u32) -> ListCommentThreadsRequest<'_> {
        ListCommentThreadsRequest {
            client: &self.client,
            base_url: &self.base_url,
            fields: GoogleAPIRequestFields::empty(),
            video_id,
            max_results,
        }
    }
}
