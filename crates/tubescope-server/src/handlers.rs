//! API route handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use tracing::{info, warn};

use tubescope_core::{AnalysisFacade, AnalysisSummary, CommentBatch, StatisticOutcome};

use crate::error::{ApiError, Result};
use crate::models::{AnalysisResponse, HealthResponse};
use crate::state::AppState;

/// GET /{video_id} - Fetch the comments and log their statistics.
pub async fn get_comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<CommentBatch>> {
    let batch = state.source.fetch_comments(&video_id).await?;
    let summary = analyze(Arc::clone(&state.analysis), batch.clone()).await?;
    log_summary(&video_id, &summary);

    Ok(Json(batch))
}

/// GET /{video_id}/analysis - Fetch the comments and return their statistics.
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<AnalysisResponse>> {
    let batch = state.source.fetch_comments(&video_id).await?;
    let summary = analyze(Arc::clone(&state.analysis), batch).await?;
    log_summary(&video_id, &summary);

    Ok(Json(AnalysisResponse {
        video_id: video_id.trim().to_string(),
        summary,
    }))
}

/// GET /health - Liveness check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Runs the analysis off the async runtime.
async fn analyze(facade: Arc<AnalysisFacade>, batch: CommentBatch) -> Result<AnalysisSummary> {
    tokio::task::spawn_blocking(move || facade.analyze_all(&batch))
        .await
        .map_err(|e| ApiError::Internal(format!("analysis task failed: {e}")))
}

fn log_summary(video_id: &str, summary: &AnalysisSummary) {
    match &summary.sentiment {
        StatisticOutcome::Report(report) => info!(
            video_id,
            counts = ?report.counts,
            score = report.score,
            sample_size = report.sample_size,
            unclassified = report.unclassified,
            "Sentiment statistics"
        ),
        StatisticOutcome::Unavailable { error, .. } => {
            warn!(video_id, statistic = "sentiment", error = %error, "Statistic unavailable")
        }
    }

    match &summary.emotion {
        StatisticOutcome::Report(report) => info!(
            video_id,
            counts = ?report.counts,
            dominant = ?report.dominant(),
            sample_size = report.sample_size,
            unclassified = report.unclassified,
            "Emotion statistics"
        ),
        StatisticOutcome::Unavailable { error, .. } => {
            warn!(video_id, statistic = "emotion", error = %error, "Statistic unavailable")
        }
    }

    match &summary.derision {
        StatisticOutcome::Report(report) => info!(
            video_id,
            counts = ?report.counts,
            ratio = report.ratio,
            sample_size = report.sample_size,
            unclassified = report.unclassified,
            "Derision statistics"
        ),
        StatisticOutcome::Unavailable { error, .. } => {
            warn!(video_id, statistic = "derision", error = %error, "Statistic unavailable")
        }
    }
}
