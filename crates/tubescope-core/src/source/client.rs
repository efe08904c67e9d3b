//! Paginating comment source client.

use tracing::{debug, info, warn};

use super::{
    retry_with_backoff, Result, RetryAction, RetryError, SourceConfig, SourceError, ThreadApi,
    ThreadPage, YouTubeThreadApi,
};
use crate::comment::{CommentBatch, CommentBatchBuilder};

/// Fetches every top-level comment of a video as one batch.
///
/// Pages are requested strictly in sequence, each with the token returned by
/// the previous one. Transient page failures are retried according to the
/// configured [`super::RetryPolicy`]; the whole call is bounded by
/// [`SourceConfig::timeout`].
pub struct CommentSourceClient<A = YouTubeThreadApi> {
    api: A,
    config: SourceConfig,
}

impl CommentSourceClient<YouTubeThreadApi> {
    /// Creates a client backed by the YouTube Data API.
    pub fn youtube(config: SourceConfig) -> Result<Self> {
        let api = YouTubeThreadApi::new(&config)?;
        Ok(Self::new(api, config))
    }
}

impl<A: ThreadApi> CommentSourceClient<A> {
    /// Creates a client over an arbitrary thread API.
    pub fn new(api: A, config: SourceConfig) -> Self {
        Self { api, config }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Fetches all top-level comments for `video_id`.
    pub async fn fetch_comments(&self, video_id: &str) -> Result<CommentBatch> {
        let video_id = video_id.trim();
        if video_id.is_empty() {
            return Err(SourceError::InvalidArgument(
                "video id must not be empty".to_string(),
            ));
        }

        let deadline = self.config.timeout;
        match tokio::time::timeout(deadline, self.collect_pages(video_id)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(video_id, timeout_ms = deadline.as_millis() as u64, "Comment fetch timed out");
                Err(SourceError::SourceTimeout(deadline))
            }
        }
    }

    async fn collect_pages(&self, video_id: &str) -> Result<CommentBatch> {
        let page_limit = self.config.max_pages.map_or(u32::MAX, |n| n.get());
        let mut builder = CommentBatchBuilder::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;

        while pages < page_limit {
            let page = self.fetch_page(video_id, page_token.as_deref()).await?;
            pages += 1;

            let received = page.comments.len();
            let mut duplicates = 0usize;
            for comment in page.comments {
                if !builder.push(comment) {
                    duplicates += 1;
                }
            }
            debug!(video_id, page = pages, received, duplicates, "Fetched comment page");

            match page.next_page_token {
                None => {
                    page_token = None;
                    break;
                }
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    warn!(video_id, page = pages, "Source repeated its page token, stopping");
                    page_token = None;
                    break;
                }
                Some(next) => page_token = Some(next),
            }
        }

        if page_token.is_some() {
            warn!(
                video_id,
                max_pages = page_limit,
                comments = builder.len(),
                "Page limit reached before the last page, returning partial batch"
            );
        }

        info!(video_id, pages, comments = builder.len(), "Fetched comment threads");
        Ok(builder.finish())
    }

    async fn fetch_page(&self, video_id: &str, page_token: Option<&str>) -> Result<ThreadPage> {
        let outcome = retry_with_backoff(&self.config.retry, |attempt| async move {
            if attempt > 0 {
                debug!(video_id, attempt = attempt + 1, "Retrying comment page");
            }
            match self.api.list_threads(video_id, page_token).await {
                Ok(page) => RetryAction::Success(page),
                Err(err) if err.is_transient() => RetryAction::Retry(err),
                Err(err) => RetryAction::Fail(err),
            }
        })
        .await;

        outcome.map_err(|err| match err {
            RetryError::Exhausted {
                attempts,
                last_error,
            } => {
                warn!(video_id, attempts, error = %last_error, "Comment source retries exhausted");
                SourceError::SourceUnavailable {
                    attempts,
                    reason: last_error.to_string(),
                }
            }
            RetryError::Aborted(err) => SourceError::from_page_error(video_id, err),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::Comment;
    use crate::source::{PageError, RetryPolicy};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays a fixed sequence of page responses.
    struct ScriptedApi {
        responses: Mutex<VecDeque<std::result::Result<ThreadPage, PageError>>>,
        tokens: Mutex<Vec<Option<String>>>,
        calls: AtomicU32,
    }

    impl ScriptedApi {
        fn new(responses: Vec<std::result::Result<ThreadPage, PageError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                tokens: Mutex::new(Vec::new()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn tokens(&self) -> Vec<Option<String>> {
            self.tokens.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ThreadApi for ScriptedApi {
        async fn list_threads(
            &self,
            _video_id: &str,
            page_token: Option<&str>,
        ) -> std::result::Result<ThreadPage, PageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tokens
                .lock()
                .unwrap()
                .push(page_token.map(str::to_string));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ThreadPage::default()))
        }
    }

    /// Never answers.
    struct StalledApi;

    #[async_trait]
    impl ThreadApi for StalledApi {
        async fn list_threads(
            &self,
            _video_id: &str,
            _page_token: Option<&str>,
        ) -> std::result::Result<ThreadPage, PageError> {
            std::future::pending().await
        }
    }

    fn comments(ids: &[&str]) -> Vec<Comment> {
        ids.iter()
            .map(|id| Comment::new(*id, format!("text {}", id)))
            .collect()
    }

    fn page(ids: &[&str], next: Option<&str>) -> std::result::Result<ThreadPage, PageError> {
        Ok(ThreadPage::new(comments(ids), next.map(str::to_string)))
    }

    fn config() -> SourceConfig {
        SourceConfig::new("test-key").with_retry(RetryPolicy::new(
            3,
            Duration::from_millis(10),
            Duration::from_millis(100),
        ))
    }

    fn ids(batch: &CommentBatch) -> Vec<&str> {
        batch.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn follows_page_tokens_in_order() {
        let api = ScriptedApi::new(vec![
            page(&["a", "b"], Some("p2")),
            page(&["c"], Some("p3")),
            page(&["d", "e", "f"], None),
        ]);
        let client = CommentSourceClient::new(api, config());

        let batch = client.fetch_comments("video").await.unwrap();
        assert_eq!(batch.len(), 6);
        assert_eq!(ids(&batch), vec!["a", "b", "c", "d", "e", "f"]);
        assert_eq!(
            client.api.tokens(),
            vec![None, Some("p2".to_string()), Some("p3".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_listing_is_an_empty_batch() {
        let api = ScriptedApi::new(vec![page(&[], None)]);
        let client = CommentSourceClient::new(api, config());

        let batch = client.fetch_comments("video").await.unwrap();
        assert!(batch.is_empty());
        assert_eq!(client.api.calls(), 1);
    }

    #[tokio::test]
    async fn duplicate_ids_across_pages_are_dropped() {
        let api = ScriptedApi::new(vec![page(&["a", "b"], Some("p2")), page(&["b", "c"], None)]);
        let client = CommentSourceClient::new(api, config());

        let batch = client.fetch_comments("video").await.unwrap();
        assert_eq!(ids(&batch), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn empty_video_id_is_rejected_before_any_request() {
        let api = ScriptedApi::new(vec![]);
        let client = CommentSourceClient::new(api, config());

        let err = client.fetch_comments("   ").await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidArgument(_)));
        assert_eq!(client.api.calls(), 0);
    }

    #[tokio::test]
    async fn comments_disabled_is_an_error_not_an_empty_batch() {
        let api = ScriptedApi::new(vec![Err(PageError::CommentsDisabled)]);
        let client = CommentSourceClient::new(api, config());

        let err = client.fetch_comments("video").await.unwrap_err();
        assert_eq!(
            err,
            SourceError::CommentsUnavailable {
                video_id: "video".into()
            }
        );
        assert_eq!(client.api.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_video_is_not_retried() {
        let api = ScriptedApi::new(vec![Err(PageError::VideoNotFound)]);
        let client = CommentSourceClient::new(api, config());

        let err = client.fetch_comments("nope").await.unwrap_err();
        assert_eq!(err.code(), "video_not_found");
        assert_eq!(client.api.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_when_third_attempt_succeeds() {
        let api = ScriptedApi::new(vec![
            Err(PageError::Transient("quotaExceeded".into())),
            Err(PageError::Transient("503".into())),
            page(&["a", "b"], None),
        ]);
        let client = CommentSourceClient::new(api, config());

        let batch = client.fetch_comments("video").await.unwrap();
        assert_eq!(ids(&batch), vec!["a", "b"]);
        assert_eq!(client.api.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_a_later_page_with_the_same_token() {
        let api = ScriptedApi::new(vec![
            page(&["a"], Some("p2")),
            Err(PageError::Transient("503".into())),
            page(&["b"], None),
        ]);
        let client = CommentSourceClient::new(api, config());

        let batch = client.fetch_comments("video").await.unwrap();
        assert_eq!(ids(&batch), vec!["a", "b"]);
        assert_eq!(
            client.api.tokens(),
            vec![None, Some("p2".to_string()), Some("p2".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_are_source_unavailable() {
        let api = ScriptedApi::new(vec![
            Err(PageError::Transient("503".into())),
            Err(PageError::Transient("503".into())),
            Err(PageError::Transient("503".into())),
            page(&["never"], None),
        ]);
        let client = CommentSourceClient::new(api, config());

        let err = client.fetch_comments("video").await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::SourceUnavailable { attempts: 3, .. }
        ));
        assert_eq!(client.api.calls(), 3);
    }

    #[tokio::test]
    async fn max_pages_bounds_the_fetch() {
        let api = ScriptedApi::new(vec![
            page(&["a"], Some("p2")),
            page(&["b"], Some("p3")),
            page(&["c"], None),
        ]);
        let client = CommentSourceClient::new(api, config().with_max_pages(2));

        let batch = client.fetch_comments("video").await.unwrap();
        assert_eq!(ids(&batch), vec!["a", "b"]);
        assert_eq!(client.api.calls(), 2);
    }

    #[tokio::test]
    async fn repeated_token_stops_pagination() {
        let api = ScriptedApi::new(vec![
            page(&["a"], Some("loop")),
            page(&["b"], Some("loop")),
            page(&["c"], None),
        ]);
        let client = CommentSourceClient::new(api, config());

        let batch = client.fetch_comments("video").await.unwrap();
        assert_eq!(ids(&batch), vec!["a", "b"]);
        assert_eq!(client.api.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_source_times_out() {
        let client = CommentSourceClient::new(
            StalledApi,
            config().with_timeout(Duration::from_secs(5)),
        );

        let err = client.fetch_comments("video").await.unwrap_err();
        assert_eq!(err, SourceError::SourceTimeout(Duration::from_secs(5)));
    }
}
