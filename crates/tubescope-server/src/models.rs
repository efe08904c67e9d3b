//! API response models.

use serde::Serialize;

use tubescope_core::AnalysisSummary;

/// Response body for GET /{video_id}/analysis.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub video_id: String,
    #[serde(flatten)]
    pub summary: AnalysisSummary,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
