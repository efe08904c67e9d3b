//! Application state for the API server.

use std::sync::Arc;

use tubescope_core::source::YouTubeThreadApi;
use tubescope_core::{AnalysisFacade, CommentSourceClient, SourceConfig, SourceError, ThreadApi};

/// Comment source client over a type-erased thread API.
pub type SharedSourceClient = CommentSourceClient<Arc<dyn ThreadApi>>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Comment source client.
    pub source: Arc<SharedSourceClient>,
    /// Statistics facade, engines built on first use.
    pub analysis: Arc<AnalysisFacade>,
}

impl AppState {
    /// Creates state from an existing client and facade.
    pub fn new(source: SharedSourceClient, analysis: Arc<AnalysisFacade>) -> Self {
        Self {
            source: Arc::new(source),
            analysis,
        }
    }

    /// Creates state backed by the YouTube Data API.
    pub fn youtube(
        config: SourceConfig,
        analysis: Arc<AnalysisFacade>,
    ) -> Result<Self, SourceError> {
        let api: Arc<dyn ThreadApi> = Arc::new(YouTubeThreadApi::new(&config)?);
        Ok(Self::new(CommentSourceClient::new(api, config), analysis))
    }
}
