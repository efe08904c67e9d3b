//! YouTube Data API v3 `commentThreads` adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use super::{PageError, SourceConfig, SourceError, TextFormat, ThreadApi, ThreadPage};
use crate::comment::Comment;

/// Error reasons the API reports for transient conditions.
const TRANSIENT_REASONS: &[&str] = &[
    "quotaExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "backendError",
];

/// Lists comment threads through the YouTube Data API.
pub struct YouTubeThreadApi {
    http: reqwest::Client,
    threads_url: Url,
    api_key: String,
    page_size: u32,
    text_format: TextFormat,
}

impl YouTubeThreadApi {
    /// Creates an adapter from the source configuration.
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        if config.api_key.trim().is_empty() {
            return Err(SourceError::Configuration("API key must not be empty".into()));
        }

        let threads_url = Url::parse(&format!(
            "{}/commentThreads",
            config.endpoint.trim_end_matches('/')
        ))
        .map_err(|e| SourceError::Configuration(format!("invalid endpoint: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("tubescope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            threads_url,
            api_key: config.api_key.clone(),
            page_size: config.page_size,
            text_format: config.text_format,
        })
    }

    fn page_url(&self, video_id: &str, page_token: Option<&str>) -> Url {
        let mut url = self.threads_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("part", "snippet")
                .append_pair("videoId", video_id)
                .append_pair("maxResults", &self.page_size.to_string())
                .append_pair("textFormat", self.text_format.as_query_value())
                .append_pair("key", &self.api_key);
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        url
    }
}

#[async_trait]
impl ThreadApi for YouTubeThreadApi {
    async fn list_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<ThreadPage, PageError> {
        let response = self
            .http
            .get(self.page_url(video_id, page_token))
            .send()
            .await
            .map_err(|e| PageError::Transient(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PageError::Transient(format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            let err = classify_failure(status, &body);
            debug!(video_id, status = status.as_u16(), error = %err, "Comment thread request failed");
            return Err(err);
        }

        parse_page(&body)
    }
}

/// Parses a successful `commentThreads.list` response body.
fn parse_page(body: &str) -> Result<ThreadPage, PageError> {
    let response: ThreadListResponse = serde_json::from_str(body)
        .map_err(|e| PageError::Transient(format!("malformed response: {}", e)))?;

    let comments = response
        .items
        .into_iter()
        .map(|item| item.snippet.top_level_comment.into_comment())
        .collect();

    let next_page_token = response.next_page_token.filter(|t| !t.is_empty());

    Ok(ThreadPage::new(comments, next_page_token))
}

/// Maps an error response to a page error.
fn classify_failure(status: StatusCode, body: &str) -> PageError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error);
    let message = detail
        .as_ref()
        .map(|d| d.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.to_string());
    let reason = detail
        .and_then(|d| d.errors.into_iter().next())
        .map(|e| e.reason);

    match reason.as_deref() {
        Some("commentsDisabled") => return PageError::CommentsDisabled,
        Some("videoNotFound") => return PageError::VideoNotFound,
        Some(r) if TRANSIENT_REASONS.contains(&r) => {
            return PageError::Transient(format!("{}: {}", r, message))
        }
        _ => {}
    }

    match status {
        StatusCode::NOT_FOUND => PageError::VideoNotFound,
        StatusCode::TOO_MANY_REQUESTS => PageError::Transient(message),
        s if s.is_server_error() => PageError::Transient(format!("HTTP {}: {}", s.as_u16(), message)),
        StatusCode::BAD_REQUEST => PageError::InvalidArgument(message),
        s => PageError::Rejected(format!("HTTP {}: {}", s.as_u16(), message)),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadListResponse {
    #[serde(default)]
    items: Vec<ThreadItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThreadItem {
    snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    id: String,
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_display: Option<String>,
    text_original: Option<String>,
    #[serde(default)]
    author_display_name: String,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    like_count: u64,
}

impl TopLevelComment {
    fn into_comment(self) -> Comment {
        let snippet = self.snippet;
        Comment {
            id: self.id,
            text: snippet
                .text_display
                .or(snippet.text_original)
                .unwrap_or_default(),
            author: snippet.author_display_name,
            published_at: snippet.published_at,
            like_count: snippet.like_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ErrorReason {
    #[serde(default)]
    reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_body(code: u16, reason: &str) -> String {
        serde_json::json!({
            "error": {
                "code": code,
                "message": "something went wrong",
                "errors": [{ "domain": "youtube", "reason": reason }]
            }
        })
        .to_string()
    }

    #[test]
    fn parses_threads_and_token() {
        let body = serde_json::json!({
            "kind": "youtube#commentThreadListResponse",
            "nextPageToken": "QURTSl9p",
            "items": [
                {
                    "id": "t1",
                    "snippet": {
                        "videoId": "abc",
                        "topLevelComment": {
                            "id": "c1",
                            "snippet": {
                                "textDisplay": "great<br>video",
                                "textOriginal": "great\nvideo",
                                "authorDisplayName": "Ann",
                                "publishedAt": "2023-04-01T12:00:00Z",
                                "likeCount": 7
                            }
                        }
                    }
                },
                {
                    "id": "t2",
                    "snippet": {
                        "topLevelComment": {
                            "id": "c2",
                            "snippet": {}
                        }
                    }
                }
            ]
        })
        .to_string();

        let page = parse_page(&body).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("QURTSl9p"));
        assert_eq!(page.comments.len(), 2);

        let first = &page.comments[0];
        assert_eq!(first.id, "c1");
        assert_eq!(first.text, "great<br>video");
        assert_eq!(first.author, "Ann");
        assert_eq!(first.like_count, 7);
        assert!(first.published_at.is_some());

        let second = &page.comments[1];
        assert_eq!(second.text, "");
        assert_eq!(second.like_count, 0);
    }

    #[test]
    fn empty_page_without_token_is_last() {
        let page = parse_page(r#"{"items": []}"#).unwrap();
        assert!(page.comments.is_empty());
        assert!(page.next_page_token.is_none());

        let page = parse_page(r#"{"nextPageToken": ""}"#).unwrap();
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn malformed_body_is_transient() {
        assert!(parse_page("{not json").unwrap_err().is_transient());
    }

    #[test]
    fn classifies_comments_disabled() {
        let err = classify_failure(StatusCode::FORBIDDEN, &error_body(403, "commentsDisabled"));
        assert_eq!(err, PageError::CommentsDisabled);
    }

    #[test]
    fn classifies_video_not_found() {
        let err = classify_failure(StatusCode::NOT_FOUND, &error_body(404, "videoNotFound"));
        assert_eq!(err, PageError::VideoNotFound);
        assert_eq!(
            classify_failure(StatusCode::NOT_FOUND, ""),
            PageError::VideoNotFound
        );
    }

    #[test]
    fn quota_and_server_errors_are_transient() {
        assert!(classify_failure(StatusCode::FORBIDDEN, &error_body(403, "quotaExceeded")).is_transient());
        assert!(classify_failure(StatusCode::FORBIDDEN, &error_body(403, "rateLimitExceeded")).is_transient());
        assert!(classify_failure(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(classify_failure(StatusCode::SERVICE_UNAVAILABLE, "oops").is_transient());
    }

    #[test]
    fn bad_request_and_forbidden_are_permanent() {
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, &error_body(400, "invalidParameter")),
            PageError::InvalidArgument(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::FORBIDDEN, &error_body(403, "forbidden")),
            PageError::Rejected(_)
        ));
    }

    #[test]
    fn page_url_carries_parameters() {
        let config = SourceConfig::new("k3y")
            .with_endpoint("https://example.test/youtube/v3/")
            .with_page_size(50);
        let api = YouTubeThreadApi::new(&config).unwrap();

        let url = api.page_url("vid", Some("tok"));
        assert_eq!(url.path(), "/youtube/v3/commentThreads");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("videoId".into(), "vid".into())));
        assert!(pairs.contains(&("maxResults".into(), "50".into())));
        assert!(pairs.contains(&("textFormat".into(), "html".into())));
        assert!(pairs.contains(&("pageToken".into(), "tok".into())));
        assert!(pairs.contains(&("key".into(), "k3y".into())));

        let first = api.page_url("vid", None);
        assert!(!first.query_pairs().any(|(k, _)| k == "pageToken"));
    }

    #[test]
    fn empty_api_key_is_a_configuration_error() {
        let err = YouTubeThreadApi::new(&SourceConfig::new("  ")).err().unwrap();
        assert_eq!(err.code(), "source_configuration");
    }
}
