//! Comment source: paginated retrieval of a video's top-level comments.
//!
//! [`CommentSourceClient`] turns the page-token protocol of the remote
//! service into a single `fetch_comments` call. The remote API itself sits
//! behind the [`ThreadApi`] trait; [`YouTubeThreadApi`] is the production
//! implementation.

mod client;
mod config;
mod retry;
mod youtube;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::comment::Comment;

pub use client::CommentSourceClient;
pub use config::{SourceConfig, TextFormat, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, MAX_PAGE_SIZE};
pub use retry::{retry_with_backoff, RetryAction, RetryError, RetryPolicy};
pub use youtube::YouTubeThreadApi;

/// Errors from fetching a video's comments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The video id is empty or was rejected as malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The video exists but its comments are disabled.
    #[error("comments are disabled for video {video_id}")]
    CommentsUnavailable { video_id: String },

    /// The source does not know the video.
    #[error("video not found: {video_id}")]
    VideoNotFound { video_id: String },

    /// Transient failures exhausted the retry budget.
    #[error("comment source unavailable after {attempts} attempt(s): {reason}")]
    SourceUnavailable { attempts: u32, reason: String },

    /// The overall fetch deadline expired.
    #[error("comment fetch exceeded deadline of {0:?}")]
    SourceTimeout(Duration),

    /// The source refused the request for a reason retrying cannot fix.
    #[error("comment source rejected the request: {0}")]
    Rejected(String),

    /// The client could not be set up.
    #[error("invalid source configuration: {0}")]
    Configuration(String),
}

impl SourceError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            SourceError::InvalidArgument(_) => "invalid_argument",
            SourceError::CommentsUnavailable { .. } => "comments_unavailable",
            SourceError::VideoNotFound { .. } => "video_not_found",
            SourceError::SourceUnavailable { .. } => "source_unavailable",
            SourceError::SourceTimeout(_) => "source_timeout",
            SourceError::Rejected(_) => "source_rejected",
            SourceError::Configuration(_) => "source_configuration",
        }
    }

    fn from_page_error(video_id: &str, err: PageError) -> Self {
        match err {
            PageError::CommentsDisabled => SourceError::CommentsUnavailable {
                video_id: video_id.to_string(),
            },
            PageError::VideoNotFound => SourceError::VideoNotFound {
                video_id: video_id.to_string(),
            },
            PageError::InvalidArgument(reason) => SourceError::InvalidArgument(reason),
            PageError::Rejected(reason) => SourceError::Rejected(reason),
            PageError::Transient(reason) => SourceError::SourceUnavailable {
                attempts: 1,
                reason,
            },
        }
    }
}

/// Result type for comment source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// One page of comment threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadPage {
    /// Top-level comments of the threads on this page, in service order.
    pub comments: Vec<Comment>,
    /// Token for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
}

impl ThreadPage {
    /// Creates a page.
    pub fn new(comments: Vec<Comment>, next_page_token: Option<String>) -> Self {
        Self {
            comments,
            next_page_token,
        }
    }

    /// Creates the last page of a listing.
    pub fn last(comments: Vec<Comment>) -> Self {
        Self::new(comments, None)
    }
}

/// Failure of a single page request, classified for retry purposes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// Rate limit, quota, server or transport failure.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Comments are disabled for the video.
    #[error("comments disabled")]
    CommentsDisabled,

    /// The video does not exist.
    #[error("video not found")]
    VideoNotFound,

    /// The service rejected a request parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other permanent refusal.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl PageError {
    /// Returns true if the request may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, PageError::Transient(_))
    }
}

/// The remote comment-thread listing API.
#[async_trait]
pub trait ThreadApi: Send + Sync {
    /// Lists one page of top-level comment threads for a video.
    async fn list_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> std::result::Result<ThreadPage, PageError>;
}

#[async_trait]
impl<T: ThreadApi + ?Sized> ThreadApi for Arc<T> {
    async fn list_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> std::result::Result<ThreadPage, PageError> {
        (**self).list_threads(video_id, page_token).await
    }
}
